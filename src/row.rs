use std::fmt;

use crate::{EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE, ROW_SIZE, USERNAME_OFFSET, USERNAME_SIZE};

/// One fixed-width record. Text columns are NUL-padded byte buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: [u8; USERNAME_SIZE],
    pub email: [u8; EMAIL_SIZE],
}

/// Copies `input` into a NUL-padded buffer, truncating so the last byte
/// always stays a terminator.
fn to_fixed_bytes<const N: usize>(input: &str) -> [u8; N] {
    let mut buffer = [0u8; N];
    let bytes = input.as_bytes();
    let len = bytes.len().min(N - 1);
    buffer[..len].copy_from_slice(&bytes[..len]);
    buffer
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

impl Row {
    /// Lengths are expected to be validated by the caller; longer input is
    /// cut at `COLUMN_USERNAME_SIZE` / `COLUMN_EMAIL_SIZE` bytes.
    pub fn new(id: u32, username: &str, email: &str) -> Self {
        Self {
            id,
            username: to_fixed_bytes(username),
            email: to_fixed_bytes(email),
        }
    }

    pub fn username(&self) -> String {
        String::from_utf8_lossy(until_nul(&self.username)).into_owned()
    }

    pub fn email(&self) -> String {
        String::from_utf8_lossy(until_nul(&self.email)).into_owned()
    }

    /// Writes every field at its fixed offset. Whole field widths are
    /// copied, so any bytes past a short string's terminator end up zero.
    pub fn serialize(&self, slot: &mut [u8; ROW_SIZE]) {
        slot[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        slot[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE].copy_from_slice(&self.username);
        slot[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE].copy_from_slice(&self.email);
    }

    pub fn deserialize(slot: &[u8; ROW_SIZE]) -> Self {
        let mut id = [0u8; ID_SIZE];
        let mut username = [0u8; USERNAME_SIZE];
        let mut email = [0u8; EMAIL_SIZE];
        id.copy_from_slice(&slot[ID_OFFSET..ID_OFFSET + ID_SIZE]);
        username.copy_from_slice(&slot[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);
        email.copy_from_slice(&slot[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);

        Self {
            id: u32::from_le_bytes(id),
            username,
            email,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}
