/// Unpacked motor status byte (bits 0-3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MotorStatus {
    pub enabled: bool,
    pub in_position: bool,
    pub stalled: bool,
    pub stall_protection: bool,
}

impl MotorStatus {
    pub fn from_byte(b: u8) -> Self {
        Self {
            enabled: b & 0x01 != 0,
            in_position: b & 0x02 != 0,
            stalled: b & 0x04 != 0,
            stall_protection: b & 0x08 != 0,
        }
    }
}

/// Unpacked homing status byte (bits 0,1,2,3,7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct HomingStatus {
    pub encoder_ready: bool,
    pub calibration_ready: bool,
    pub homing_in_progress: bool,
    pub homing_failed: bool,
    pub homing_pin_active: bool,
}

impl HomingStatus {
    pub fn from_byte(b: u8) -> Self {
        Self {
            encoder_ready: b & 0x01 != 0,
            calibration_ready: b & 0x02 != 0,
            homing_in_progress: b & 0x04 != 0,
            homing_failed: b & 0x08 != 0,
            homing_pin_active: b & 0x80 != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_status_bits() {
        let s = MotorStatus::from_byte(0b0000_1011);
        assert!(s.enabled);
        assert!(s.in_position);
        assert!(!s.stalled);
        assert!(s.stall_protection);
    }

    #[test]
    fn homing_status_bits() {
        let s = HomingStatus::from_byte(0b1000_0100);
        assert!(s.homing_in_progress);
        assert!(s.homing_pin_active);
        assert!(!s.homing_failed);
    }
}
