// T'Rex control register block
//
// The board takes its whole configuration as one 26-byte packet:
// [pwm, left_hi, left_lo, left_brake, right_hi, right_lo, right_brake,
//  servo1_hi, servo1_lo, ... servo6_hi, servo6_lo, devibrate,
//  impact_hi, impact_lo, battery_hi, battery_lo, i2c_address, i2c_clock]
// Multi-byte values are big-endian.

use crate::config::{DEFAULT_BATTERY_REFERENCE, TREX_ADDRESS};

/// Number of bytes in the control register block
pub const REGISTER_COUNT: usize = 26;

/// Number of servo channels on the board
pub const SERVO_COUNT: u8 = 6;

/// Register offsets
pub const PWM_FREQUENCY: usize = 0;
pub const LEFT_SPEED: usize = 1; // 2 bytes
pub const LEFT_BRAKE: usize = 3;
pub const RIGHT_SPEED: usize = 4; // 2 bytes
pub const RIGHT_BRAKE: usize = 6;
pub const SERVO_BASE: usize = 7; // 6 x 2 bytes
pub const DEVIBRATE: usize = 19;
pub const IMPACT_SENSITIVITY: usize = 20; // 2 bytes
pub const BATTERY_REFERENCE: usize = 22; // 2 bytes
pub const I2C_ADDRESS: usize = 24;
pub const I2C_CLOCK: usize = 25;

/// Power-on values
const DEFAULT_PWM_FREQUENCY: u8 = 6;
const DEFAULT_SERVO_1: u16 = 1500;
const DEFAULT_DEVIBRATE: u8 = 50;
const DEFAULT_IMPACT_SENSITIVITY: u16 = 50;

/// Split a 16-bit value into its (high, low) bytes
pub fn split_high_low(value: u16) -> (u8, u8) {
    ((value >> 8) as u8, (value & 0xFF) as u8)
}

/// Join a (high, low) byte pair back into a 16-bit value
pub fn combine_high_low(high: u8, low: u8) -> u16 {
    ((high as u16) << 8) + low as u16
}

/// Byte offsets (high, low) of a servo channel, or `None` outside 1..=6
pub fn servo_offsets(servo: u8) -> Option<(usize, usize)> {
    if !(1..=SERVO_COUNT).contains(&servo) {
        return None;
    }
    let servo = servo as usize;
    Some((5 + 2 * servo, 6 + 2 * servo))
}

/// In-memory mirror of the board's writable registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBlock {
    bytes: [u8; REGISTER_COUNT],
    battery_reference: u16,
}

impl Default for RegisterBlock {
    fn default() -> Self {
        Self::new(DEFAULT_BATTERY_REFERENCE)
    }
}

impl RegisterBlock {
    /// Create a block holding the power-on defaults
    pub fn new(battery_reference: u16) -> Self {
        let mut block = Self {
            bytes: [0; REGISTER_COUNT],
            battery_reference,
        };
        block.reset();
        block
    }

    /// Restore every register to its default value
    pub fn reset(&mut self) {
        self.bytes = [0; REGISTER_COUNT];
        self.bytes[PWM_FREQUENCY] = DEFAULT_PWM_FREQUENCY;
        self.put_u16(SERVO_BASE, DEFAULT_SERVO_1);
        self.bytes[DEVIBRATE] = DEFAULT_DEVIBRATE;
        self.put_u16(IMPACT_SENSITIVITY, DEFAULT_IMPACT_SENSITIVITY);
        self.put_u16(BATTERY_REFERENCE, self.battery_reference);
        self.bytes[I2C_ADDRESS] = TREX_ADDRESS;
        self.bytes[I2C_CLOCK] = 0;
    }

    /// Set both motor speeds (-255..=255, negative runs astern)
    pub fn set_motor_speeds(&mut self, left: i16, right: i16) {
        self.put_u16(LEFT_SPEED, left as u16);
        self.put_u16(RIGHT_SPEED, right as u16);
    }

    pub fn set_brakes(&mut self, left: u8, right: u8) {
        self.bytes[LEFT_BRAKE] = left;
        self.bytes[RIGHT_BRAKE] = right;
    }

    /// Set a servo position; returns false if the servo number is not 1..=6
    pub fn set_servo(&mut self, servo: u8, position: u16) -> bool {
        let Some((high, low)) = servo_offsets(servo) else {
            return false;
        };
        let (hi, lo) = split_high_low(position);
        self.bytes[high] = hi;
        self.bytes[low] = lo;
        true
    }

    pub fn set_devibrate(&mut self, strength: u8) {
        self.bytes[DEVIBRATE] = strength;
    }

    pub fn set_impact_sensitivity(&mut self, threshold: u16) {
        self.put_u16(IMPACT_SENSITIVITY, threshold);
    }

    pub fn left_speed(&self) -> i16 {
        self.get_u16(LEFT_SPEED) as i16
    }

    pub fn right_speed(&self) -> i16 {
        self.get_u16(RIGHT_SPEED) as i16
    }

    pub fn servo(&self, servo: u8) -> Option<u16> {
        servo_offsets(servo).map(|(high, low)| combine_high_low(self.bytes[high], self.bytes[low]))
    }

    /// Raw packet as sent on the wire
    pub fn as_bytes(&self) -> &[u8; REGISTER_COUNT] {
        &self.bytes
    }

    fn put_u16(&mut self, offset: usize, value: u16) {
        let (hi, lo) = split_high_low(value);
        self.bytes[offset] = hi;
        self.bytes[offset + 1] = lo;
    }

    fn get_u16(&self, offset: usize) -> u16 {
        combine_high_low(self.bytes[offset], self.bytes[offset + 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_high_low() {
        assert_eq!(split_high_low(1500), (5, 220));
        assert_eq!(split_high_low(50), (0, 50));
        assert_eq!(split_high_low(0xFFFF), (0xFF, 0xFF));
        assert_eq!(combine_high_low(5, 220), 1500);
        assert_eq!(combine_high_low(0x03, 0xE8), 1000);
    }

    #[test]
    fn test_motor_speed_survives_byte_split() {
        for speed in -255i16..=255 {
            let (hi, lo) = split_high_low(speed as u16);
            assert_eq!(combine_high_low(hi, lo) as i16, speed, "speed {}", speed);
        }
    }

    #[test]
    fn test_negative_speed_is_twos_complement() {
        let mut block = RegisterBlock::default();
        block.set_motor_speeds(-1, -255);
        let bytes = block.as_bytes();
        assert_eq!(&bytes[1..3], &[0xFF, 0xFF]);
        assert_eq!(&bytes[4..6], &[0xFF, 0x01]);
        assert_eq!(block.left_speed(), -1);
        assert_eq!(block.right_speed(), -255);
    }

    #[test]
    fn test_defaults() {
        let block = RegisterBlock::default();
        assert_eq!(
            block.as_bytes(),
            &[
                6, 0, 0, 0, 0, 0, 0, // pwm, motors, brakes
                5, 220, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // servos
                50, 0, 50, // devibrate, impact
                2, 38, // battery reference
                7, 0, // i2c address, clock
            ]
        );
        assert_eq!(block.servo(1), Some(1500));
    }

    #[test]
    fn test_custom_battery_reference() {
        let block = RegisterBlock::new(0x0348);
        assert_eq!(block.as_bytes()[22], 0x03);
        assert_eq!(block.as_bytes()[23], 0x48);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut block = RegisterBlock::default();
        block.set_motor_speeds(200, -200);
        block.set_brakes(1, 1);
        block.set_servo(4, 1800);
        block.set_devibrate(0);
        block.set_impact_sensitivity(900);
        block.reset();
        assert_eq!(block, RegisterBlock::default());
    }

    #[test]
    fn test_servo_offsets() {
        assert_eq!(servo_offsets(1), Some((7, 8)));
        assert_eq!(servo_offsets(6), Some((17, 18)));
        assert_eq!(servo_offsets(0), None);
        assert_eq!(servo_offsets(7), None);
    }

    #[test]
    fn test_servo_touches_only_its_pair() {
        for servo in 1..=SERVO_COUNT {
            let mut block = RegisterBlock::default();
            let before = *block.as_bytes();
            assert!(block.set_servo(servo, 0xABCD));
            let (high, low) = servo_offsets(servo).unwrap();
            for (i, (&a, &b)) in before.iter().zip(block.as_bytes()).enumerate() {
                if i == high {
                    assert_eq!(b, 0xAB);
                } else if i == low {
                    assert_eq!(b, 0xCD);
                } else {
                    assert_eq!(a, b, "servo {} touched byte {}", servo, i);
                }
            }
            assert!((7..=18).contains(&high) && (7..=18).contains(&low));
        }
    }

    #[test]
    fn test_invalid_servo_leaves_block_untouched() {
        let mut block = RegisterBlock::default();
        assert!(!block.set_servo(0, 1000));
        assert!(!block.set_servo(7, 1000));
        assert_eq!(block, RegisterBlock::default());
    }
}
