//! Receiver reference decoder (§4.7): decodes the wire frame built by
//! [`crate::network`]. Stands in for the physical bridge in tests.

use crate::error::{PodError, PodResult};

pub const PACKET_LENGTH: usize = 39;
const NUM_LEGS: usize = 6;

const COXA_OFFSET: usize = 1;
const FEMUR_OFFSET: usize = 3;
const TIBIA_OFFSET: usize = 5;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DecodedLeg {
    pub id: u8,
    pub coxa: u16,
    pub femur: u16,
    pub tibia: u16,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DecodedFrame {
    pub network_id: u8,
    pub legs: [DecodedLeg; NUM_LEGS],
}

/// Decodes a 39-byte, 6-leg servo frame built to the §4.6 layout. Fails with
/// [`PodError::MalformedFrame`] for any other length.
pub fn decode(buf: &[u8]) -> PodResult<DecodedFrame> {
    if buf.len() != PACKET_LENGTH {
        return Err(PodError::MalformedFrame {
            actual: buf.len(),
            expected: PACKET_LENGTH,
        });
    }

    let network_id = buf[0];
    let mut legs = [DecodedLeg {
        id: 0,
        coxa: 0,
        femur: 0,
        tibia: 0,
    }; NUM_LEGS];

    for (leg_index, leg) in legs.iter_mut().enumerate() {
        let base = leg_index * 6;
        *leg = DecodedLeg {
            id: leg_index as u8 + 1,
            coxa: u16::from_le_bytes([buf[COXA_OFFSET + base], buf[COXA_OFFSET + base + 1]]),
            femur: u16::from_le_bytes([buf[FEMUR_OFFSET + base], buf[FEMUR_OFFSET + base + 1]]),
            tibia: u16::from_le_bytes([buf[TIBIA_OFFSET + base], buf[TIBIA_OFFSET + base + 1]]),
        };
    }

    Ok(DecodedFrame { network_id, legs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::example_hexapod_1;
    use crate::network::NetworkEmitter;
    use crate::pod::Pod;

    #[test]
    fn round_trips_with_the_emitter() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.zero();
        let emitter = NetworkEmitter::new(3);
        let frame = emitter.build_frame(&pod);

        assert_eq!(frame.len(), PACKET_LENGTH);
        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.network_id, 3);
        for leg in &decoded.legs {
            assert_eq!(leg.coxa, 512);
            assert_eq!(leg.femur, 512);
            assert_eq!(leg.tibia, 512);
        }
    }

    #[test]
    fn wrong_length_is_malformed() {
        let result = decode(&[0u8; 10]);
        assert!(matches!(result, Err(PodError::MalformedFrame { .. })));
    }
}
