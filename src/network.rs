//! Outbound servo frame emitter (§4.6): builds a fixed-layout frame from
//! current joint triples and fires it at a connected datagram socket.

use crate::pod::Pod;
use std::net::UdpSocket;

/// Reference servo range in degrees; see the per-joint raw encoding in §4.6.
const SERVO_RANGE: f64 = 300.0;

/// `Streaming` emits a live frame every [`NetworkEmitter::update`]; `Primitive`
/// is reserved for future command-based control and emits nothing (§4.6).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ControlMode {
    Streaming,
    Primitive,
}

/// Maps one joint angle (degrees) to its raw 16-bit servo unit, wrapping on
/// overflow exactly as an unsigned 16-bit store would.
fn raw_unit(angle: f64, mirrored: bool) -> u16 {
    let unmirrored = ((angle / SERVO_RANGE) * 1024.0 + 512.0) as i64;
    let value = if mirrored { 1024 - unmirrored } else { unmirrored };
    (value as i128).rem_euclid(1 << 16) as u16
}

pub struct NetworkEmitter {
    id: u8,
    socket: Option<UdpSocket>,
    is_running: bool,
    mode: ControlMode,
}

impl NetworkEmitter {
    pub fn new(id: u8) -> Self {
        NetworkEmitter {
            id,
            socket: None,
            is_running: false,
            mode: ControlMode::Streaming,
        }
    }

    pub fn dial(&mut self, address: &str) -> std::io::Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(address)?;
        self.socket = Some(socket);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.socket = None;
    }

    pub fn start(&mut self) {
        self.is_running = true;
    }

    pub fn stop(&mut self) {
        self.is_running = false;
    }

    pub fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
    }

    /// Builds the current frame for `pod` per §4.6's layout. Exposed
    /// separately from [`NetworkEmitter::update`] so tests (and the wire
    /// decoder round trip) can inspect the bytes without a real socket.
    pub fn build_frame(&self, pod: &Pod) -> Vec<u8> {
        build_frame(self.id, pod)
    }

    /// Fire-and-forget write of the current frame. No-op unless connected,
    /// running, and in `Streaming` mode. Send failures are logged, not
    /// returned: per §7, socket errors are non-fatal to the engine.
    pub fn update(&self, pod: &Pod) {
        if self.mode != ControlMode::Streaming || !self.is_running {
            return;
        }
        let Some(socket) = &self.socket else {
            return;
        };
        let frame = self.build_frame(pod);
        if let Err(error) = socket.send(&frame) {
            tracing::warn!(%error, "failed to send servo frame");
        }
    }
}

fn build_frame(id: u8, pod: &Pod) -> Vec<u8> {
    let num_legs = pod.legs.len();
    let mut frame = vec![0u8; 2 * 3 * num_legs + 3];
    let mut checksum: u16 = 0;

    frame[0] = id;
    checksum ^= id as u16;

    for (i, leg) in pod.legs.iter().enumerate() {
        let angles = leg.current_angles;
        let coxa = raw_unit(angles.coxa, true);
        let femur = raw_unit(angles.femur, false);
        let tibia = raw_unit(angles.tibia, false);

        checksum ^= coxa;
        checksum ^= femur;
        checksum ^= tibia;

        let base = 1 + i * 6;
        frame[base..base + 2].copy_from_slice(&coxa.to_le_bytes());
        frame[base + 2..base + 4].copy_from_slice(&femur.to_le_bytes());
        frame[base + 4..base + 6].copy_from_slice(&tibia.to_le_bytes());
    }

    // The low checksum byte is the 8-bit truncation of `checksum << 8`, which
    // is always zero. Receivers in the field were built against this exact
    // byte, so the shift stays even though `checksum & 0xFF` is clearly meant.
    let low = (checksum.wrapping_shl(8)) as u8;
    let high = (checksum >> 8) as u8;
    let checksum_offset = 1 + 6 * num_legs;
    frame[checksum_offset] = low;
    frame[checksum_offset + 1] = high;

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::example_hexapod_1;
    use crate::pod::Pod;

    #[test]
    fn all_zero_angles_produce_the_documented_bytes() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.zero();
        let frame = build_frame(0, &pod);

        assert_eq!(frame.len(), 39);
        assert_eq!(&frame[1..7], &[0x00, 0x02, 0x00, 0x02, 0x00, 0x02]);
    }

    #[test]
    fn checksum_low_byte_is_truncated_per_reference_bug() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.zero();
        let frame = build_frame(7, &pod);
        assert_eq!(frame[frame.len() - 2], 0);
    }

    #[test]
    fn frame_length_matches_leg_count() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.zero();
        let frame = build_frame(1, &pod);
        assert_eq!(frame.len(), 2 * 3 * pod.legs.len() + 3);
    }
}
