// T'Rex status block decoding
//
// Status packet layout (24 bytes, big-endian pairs):
// [start, prev_cmd, battery_hi, battery_lo, left_current_hi, left_current_lo,
//  left_encoder(2), right_current_hi, right_current_lo, right_encoder(2),
//  accel_x(2), accel_y(2), accel_z(2), impact_x(2), impact_y(2), impact_z(2)]

use serde::Serialize;

use super::registers::combine_high_low;

/// Number of bytes in a status block
pub const STATUS_COUNT: usize = 24;

/// Byte offsets of the high byte of each reading
const PREVIOUS_COMMAND: usize = 1;
const BATTERY: usize = 2;
const LEFT_CURRENT: usize = 4;
const RIGHT_CURRENT: usize = 8;
const ACCEL_X: usize = 12;
const ACCEL_Y: usize = 14;
const ACCEL_Z: usize = 16;
const IMPACT_X: usize = 18;
const IMPACT_Y: usize = 20;
const IMPACT_Z: usize = 22;

/// Decoded telemetry from one status read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Telemetry {
    /// Status of the previous command packet, when echo is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_command: Option<u8>,
    /// Battery voltage x100, calibration offset applied
    pub battery_voltage: i32,
    /// Motor current draw in mA
    pub left_motor_current: u16,
    pub right_motor_current: u16,
    pub accelerometer_x: u16,
    pub accelerometer_y: u16,
    pub accelerometer_z: u16,
    pub impact_x: u16,
    pub impact_y: u16,
    pub impact_z: u16,
}

impl Telemetry {
    /// Decode a raw status block
    pub fn decode(block: &[u8; STATUS_COUNT], voltage_offset: i32, command_echo: bool) -> Self {
        let pair = |offset: usize| combine_high_low(block[offset], block[offset + 1]);

        Self {
            previous_command: command_echo.then_some(block[PREVIOUS_COMMAND]),
            battery_voltage: pair(BATTERY) as i32 + voltage_offset,
            left_motor_current: pair(LEFT_CURRENT),
            right_motor_current: pair(RIGHT_CURRENT),
            accelerometer_x: pair(ACCEL_X),
            accelerometer_y: pair(ACCEL_Y),
            accelerometer_z: pair(ACCEL_Z),
            impact_x: pair(IMPACT_X),
            impact_y: pair(IMPACT_Y),
            impact_z: pair(IMPACT_Z),
        }
    }

    /// All readings in order, command echo first when present
    pub fn values(&self) -> Vec<i64> {
        let mut values = Vec::with_capacity(10);
        if let Some(prev) = self.previous_command {
            values.push(prev as i64);
        }
        values.push(self.battery_voltage as i64);
        values.extend(
            [
                self.left_motor_current,
                self.right_motor_current,
                self.accelerometer_x,
                self.accelerometer_y,
                self.accelerometer_z,
                self.impact_x,
                self.impact_y,
                self.impact_z,
            ]
            .map(i64::from),
        );
        values
    }

    /// Readings joined as one comma-separated line
    pub fn to_delimited_line(&self) -> String {
        self.values()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
