//! Generic get/set of codec tuning parameters.
//!
//! Mirrors the native control-command protocol: a numeric request code plus
//! either an input value or a single output slot. The binding does not
//! interpret request codes beyond refusing the few whose argument cannot
//! round-trip through one `i32`.

use crate::error::Result;

/// Parameter get/set on an open codec context.
///
/// Encoders and decoders implement this separately, so a decoder request can
/// never reach an encoder state.
pub trait Control {
    /// Reads a parameter through a single `i32` output slot.
    fn get(&mut self, request: i32) -> Result<i32>;

    /// Writes a parameter.
    fn set(&mut self, request: i32, value: i32) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Slot(i32);

    impl Control for Slot {
        fn get(&mut self, request: i32) -> Result<i32> {
            if request == 1 { Ok(self.0) } else { Err(Error::BadArgument("request")) }
        }

        fn set(&mut self, request: i32, value: i32) -> Result<()> {
            if request == 0 {
                self.0 = value;
                Ok(())
            } else {
                Err(Error::BadArgument("request"))
            }
        }
    }

    #[test]
    fn test_control_round_trip_through_trait_object() {
        let mut slot = Slot(0);
        let ctl: &mut dyn Control = &mut slot;
        ctl.set(0, 42).unwrap();
        assert_eq!(ctl.get(1).unwrap(), 42);
        assert!(ctl.get(7).is_err());
    }
}
