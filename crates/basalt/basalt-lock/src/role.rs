use serde::Deserialize;

/// Holder cell value when nobody owns the lock.
pub(crate) const FREE: u8 = 0;

/// The two parties that ever take the lock.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Consumer = 1,
    Producer = 2,
}

impl Role {
    #[inline(always)]
    pub(crate) fn tag(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    pub(crate) fn from_tag(tag: u8) -> Option<Role> {
        match tag {
            1 => Some(Role::Consumer),
            2 => Some(Role::Producer),
            _ => None,
        }
    }
}

/// Which discipline guards the queue. Fixed once a run starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStrategy {
    Mutex,
    #[default]
    Spin,
}
