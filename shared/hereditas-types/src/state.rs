/// Lifecycle of a will.
///
/// `Empty` is reachable only through the deferred ("diary") creation flow
/// and through `emptyForEdit`. `Executed` is terminal for both cancellation
/// and distribution; no mutating operation succeeds afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WillState {
    Empty = 0,
    Active = 1,
    Executed = 2,
}

impl WillState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WillState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        let state = match value {
            0 => WillState::Empty,
            1 => WillState::Active,
            2 => WillState::Executed,
            _ => return Err(()),
        };
        Ok(state)
    }
}
