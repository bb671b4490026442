/// A packet owned by the host stack side, as handed to the capture hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketBuf {
    data: Vec<u8>,
}

impl PacketBuf {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self { data: data.to_vec() }
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for PacketBuf {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
