#[cfg(feature = "simulator")]
#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use ringbridge::simulator::SimStack;
    use ringbridge::{
        AdapterBuilder, Direction, Doorbell, GenericAdapter, RingDevice, RxVerdict, SlotFlags,
        SyncFlags,
    };
    use std::sync::Arc;

    fn setup(name: &str, slots: u32) -> (Arc<SimStack>, GenericAdapter<SimStack>, Arc<Doorbell>) {
        let stack = Arc::new(SimStack::new(name));
        let doorbell = Arc::new(Doorbell::new());
        let adapter = AdapterBuilder::new(stack.clone())
            .num_rx_desc(slots)
            .num_tx_desc(slots)
            .rx_notifier(doorbell.clone())
            .build()
            .expect("Failed to build adapter");
        adapter.enable().expect("Failed to enable adapter");
        (stack, adapter, doorbell)
    }

    #[test]
    fn test_captured_packets_land_in_consecutive_slots() {
        let (stack, adapter, doorbell) = setup("rx0", 8);
        for len in [64usize, 128, 200] {
            assert_eq!(stack.inject(&vec![len as u8; len]), Some(RxVerdict::Queued));
        }
        assert_eq!(doorbell.rings(), 3);

        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.imported, 3);
        assert_eq!(report.released, 0);

        let ring = adapter.ring(Direction::Rx);
        for (pos, len) in [(0u32, 64u16), (1, 128), (2, 200)] {
            assert_eq!(ring.slot(ring.idx(pos).unwrap()).len, len);
        }
        let status = adapter.kring_status(Direction::Rx);
        assert_eq!(status.hw_cur, 0);
        assert_eq!(status.hw_avail, 3);
        assert_eq!(status.import_cursor, Some(3));
        assert_eq!(ring.avail(), 3);
        assert_eq!(adapter.stats().rx_queued, 0);

        // Nothing new arrived and the consumer did not move.
        let again = adapter.sync(Direction::Rx, SyncFlags::FORCE_READ).unwrap();
        assert!(again.is_idle());
        assert_eq!(adapter.kring_status(Direction::Rx), status);
        assert_eq!(ring.avail(), 3);
    }

    #[test]
    fn test_consumer_reads_packets_and_releases_slots() {
        let (stack, adapter, _) = setup("rx1", 8);
        stack.inject(b"first");
        stack.inject(b"second");
        adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();

        let mut client = adapter.client(Direction::Rx).expect("RX ring already claimed");
        assert_eq!(client.recv().as_deref(), Some(&b"first"[..]));
        assert_eq!(client.recv().as_deref(), Some(&b"second"[..]));
        assert!(client.recv().is_none());

        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.released, 2);
        let status = adapter.kring_status(Direction::Rx);
        assert_eq!(status.hw_cur, 2);
        assert_eq!(status.hw_avail, 0);
        assert_eq!(client.avail(), 0);
    }

    #[test]
    fn test_fifo_overload_drops_excess() {
        let stack = Arc::new(SimStack::new("rx2"));
        let adapter = AdapterBuilder::new(stack.clone())
            .num_rx_desc(8)
            .rx_queue_capacity(4)
            .build()
            .unwrap();
        adapter.enable().unwrap();

        let verdicts: Vec<_> = (0..10u8).map(|i| stack.inject(&[i; 60]).unwrap()).collect();
        assert_eq!(verdicts.iter().filter(|v| **v == RxVerdict::Queued).count(), 5);

        let stats = adapter.stats();
        assert_eq!(stats.rx_dropped, 5);
        assert_eq!(stats.rx_queued, 5);

        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.imported, 5);

        // The oldest packets survived.
        let mut client = adapter.client(Direction::Rx).unwrap();
        for i in 0..5u8 {
            assert_eq!(client.recv().unwrap(), vec![i; 60]);
        }
    }

    #[test]
    fn test_default_fifo_admits_one_past_capacity() {
        let (stack, adapter, _) = setup("rx2b", 8);
        let queued = (0..1026u32)
            .filter(|i| stack.inject(&i.to_be_bytes()) == Some(RxVerdict::Queued))
            .count();
        assert_eq!(queued, 1025);

        let stats = adapter.stats();
        assert_eq!(stats.rx_queued, 1025);
        assert_eq!(stats.rx_dropped, 1);
    }

    #[test]
    fn test_ring_never_fills_completely() {
        let (stack, adapter, _) = setup("rx3", 8);
        for i in 0..12u8 {
            stack.inject(&[i; 32]);
        }
        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.imported, 7);
        assert_eq!(adapter.stats().rx_queued, 5);

        // Freeing slots lets the rest in, in order.
        let mut client = adapter.client(Direction::Rx).unwrap();
        for i in 0..7u8 {
            assert_eq!(client.recv().unwrap()[0], i);
        }
        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.released, 7);
        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.imported, 5);
        for i in 7..12u8 {
            assert_eq!(client.recv().unwrap()[0], i);
        }
    }

    #[test]
    fn test_wraparound_keeps_order() {
        let (stack, adapter, _) = setup("rx4", 8);
        let mut client = adapter.client(Direction::Rx).unwrap();
        let mut expected_cur = 0u32;
        let mut seq = 0u32;

        for _round in 0..40 {
            for _ in 0..3 {
                stack.inject(&seq.to_be_bytes());
                seq += 1;
            }
            adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
            for back in (1..=3u32).rev() {
                let packet = client.recv().unwrap();
                assert_eq!(u32::from_be_bytes(packet[..4].try_into().unwrap()), seq - back);
            }
            adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();

            expected_cur = (expected_cur + 3) % 8;
            let status = adapter.kring_status(Direction::Rx);
            assert_eq!(status.hw_cur, expected_cur);
            assert_eq!(status.hw_avail, 0);
        }
    }

    #[test]
    fn test_reserved_slots_are_kept() {
        let (stack, adapter, _) = setup("rx5", 8);
        for i in 0..3u8 {
            stack.inject(&[i; 16]);
        }
        adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();

        let mut client = adapter.client(Direction::Rx).unwrap();
        while client.recv().is_some() {}
        client.set_reserved(1);

        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.released, 2);
        let status = adapter.kring_status(Direction::Rx);
        assert_eq!(status.hw_cur, 2);
        assert_eq!(status.hw_avail, 1);
        assert_eq!(client.avail(), 0);
    }

    #[test]
    fn test_pending_gates_import_when_mitigated() {
        let stack = Arc::new(SimStack::new("rx6"));
        let adapter = AdapterBuilder::new(stack.clone())
            .num_rx_desc(4)
            .no_pendintr(false)
            .build()
            .unwrap();
        adapter.enable().unwrap();

        for i in 0..5u8 {
            stack.inject(&[i; 8]);
        }
        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.imported, 3);

        let mut client = adapter.client(Direction::Rx).unwrap();
        while client.recv().is_some() {}
        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.released, 3);

        // Room is back but no capture arrived since the flag was consumed.
        let report = adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        assert_eq!(report.imported, 0);
        assert_eq!(adapter.stats().rx_queued, 2);

        let report = adapter.sync(Direction::Rx, SyncFlags::FORCE_READ).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(client.recv().unwrap(), vec![3; 8]);
    }

    #[test]
    fn test_slot_flags_applied_on_import() {
        let stack = Arc::new(SimStack::new("rx7"));
        let adapter = AdapterBuilder::new(stack.clone())
            .rx_slot_flags(SlotFlags::FORWARD)
            .build()
            .unwrap();
        adapter.enable().unwrap();

        stack.inject(&[0; 60]);
        adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
        let ring = adapter.ring(Direction::Rx);
        assert_eq!(ring.slot(ring.idx(0).unwrap()).flags, SlotFlags::FORWARD);
    }

    #[test]
    fn test_oversized_capture_is_dropped() {
        let (stack, adapter, doorbell) = setup("rx8", 8);
        assert_eq!(stack.inject(&vec![0; 4000]), Some(RxVerdict::Dropped));
        assert_eq!(doorbell.rings(), 0);
        assert_eq!(adapter.stats().rx_oversized, 1);
        assert_eq!(adapter.stats().rx_queued, 0);
    }

    fn seq_of(packet: &[u8]) -> u32 {
        u32::from_be_bytes([packet[0], packet[1], packet[2], packet[3]])
    }

    proptest! {
        #[test]
        fn prop_rx_delivers_each_accepted_packet_once_in_order(
            ops in proptest::collection::vec((0u32..8, 0u32..8, any::<bool>()), 1..40)
        ) {
            let stack = Arc::new(SimStack::new("rx-prop"));
            let adapter = AdapterBuilder::new(stack.clone())
                .num_rx_desc(8)
                .rx_queue_capacity(3)
                .build()
                .unwrap();
            adapter.enable().unwrap();
            let mut client = adapter.client(Direction::Rx).unwrap();

            let mut next_seq = 0u32;
            let mut accepted = Vec::new();
            let mut received = Vec::new();

            for (injects, reads, resync) in ops {
                for _ in 0..injects {
                    if stack.inject(&next_seq.to_be_bytes()) == Some(RxVerdict::Queued) {
                        accepted.push(next_seq);
                    }
                    next_seq += 1;
                }
                adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
                for _ in 0..reads {
                    match client.recv() {
                        Some(packet) => received.push(seq_of(&packet)),
                        None => break,
                    }
                }
                if resync {
                    adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
                }

                let status = adapter.kring_status(Direction::Rx);
                let import_cursor = status.import_cursor.unwrap();
                prop_assert_eq!(status.hw_avail, (import_cursor + 8 - status.hw_cur) % 8);
                prop_assert_eq!(adapter.stats().rx_dropped, (next_seq as usize - accepted.len()) as u64);
            }

            for _ in 0..accepted.len() + 2 {
                adapter.sync(Direction::Rx, SyncFlags::empty()).unwrap();
                while let Some(packet) = client.recv() {
                    received.push(seq_of(&packet));
                }
            }
            prop_assert_eq!(received, accepted);
        }
    }

    #[tokio::test]
    #[cfg(feature = "async")]
    async fn test_async_wait_rx() {
        use ringbridge::reactor::{wait_rx, AsyncDoorbell};
        use std::time::Duration;

        let stack = Arc::new(SimStack::new("rx-async0"));
        let doorbell = Arc::new(AsyncDoorbell::new());
        let adapter = AdapterBuilder::new(stack.clone())
            .rx_notifier(doorbell.clone())
            .build()
            .unwrap();
        adapter.enable().unwrap();

        let injector = {
            let stack = stack.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                stack.inject(&[0x11, 0x22, 0x33, 0x44])
            })
        };

        let avail = tokio::time::timeout(Duration::from_secs(5), wait_rx(&adapter, &doorbell))
            .await
            .expect("Timed out waiting for RX")
            .expect("RX sync failed");
        assert_eq!(avail, 1);
        assert_eq!(injector.await.unwrap(), Some(RxVerdict::Queued));

        let mut client = adapter.client(Direction::Rx).unwrap();
        assert_eq!(client.recv().unwrap(), vec![0x11, 0x22, 0x33, 0x44]);
    }
}
