/// A slot position in a ring of `num_slots` entries.
///
/// All cursor arithmetic (`cur`, `hw_cur`, the RX import cursor) goes through
/// this type so that wraparound lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingIdx {
    pos: u32,
    num_slots: u32,
}

impl RingIdx {
    /// Returns `None` if `pos` does not name a slot of the ring.
    #[inline]
    pub fn new(pos: u32, num_slots: u32) -> Option<Self> {
        if pos >= num_slots {
            return None;
        }
        Some(Self { pos, num_slots })
    }

    #[inline]
    pub fn zero(num_slots: u32) -> Self {
        assert!(num_slots > 0, "ring must have at least one slot");
        Self { pos: 0, num_slots }
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.pos
    }

    #[inline]
    pub fn num_slots(self) -> u32 {
        self.num_slots
    }

    #[inline]
    pub fn next(self) -> Self {
        let pos = if self.pos + 1 == self.num_slots { 0 } else { self.pos + 1 };
        Self { pos, ..self }
    }

    #[inline]
    pub fn prev(self) -> Self {
        let pos = if self.pos == 0 { self.num_slots - 1 } else { self.pos - 1 };
        Self { pos, ..self }
    }

    #[inline]
    pub fn advance(self, n: u32) -> Self {
        let n = (n % self.num_slots) as u64;
        let pos = ((self.pos as u64 + n) % self.num_slots as u64) as u32;
        Self { pos, ..self }
    }

    #[inline]
    pub fn retreat(self, n: u32) -> Self {
        let n = n % self.num_slots;
        self.advance(self.num_slots - n)
    }

    /// Number of `next()` steps needed to get from `self` to `other`.
    #[inline]
    pub fn distance_to(self, other: Self) -> u32 {
        debug_assert_eq!(self.num_slots, other.num_slots);
        if other.pos >= self.pos {
            other.pos - self.pos
        } else {
            self.num_slots - self.pos + other.pos
        }
    }

    /// Iterates the slots from `self` up to, but excluding, `end`.
    pub fn until(self, end: Self) -> impl Iterator<Item = RingIdx> {
        let count = self.distance_to(end);
        let mut cursor = self;
        (0..count).map(move |_| {
            let current = cursor;
            cursor = cursor.next();
            current
        })
    }
}
