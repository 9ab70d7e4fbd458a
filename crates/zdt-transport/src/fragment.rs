/// Splits a command longer than 8 bytes into ordered CAN frames sharing a
/// base frame-id, replicating the function-code byte across every fragment
/// after the first. This is a firmware-dictated framing, not IP-style
/// fragmentation: the receiver reassembles by function-code prefix, not by
/// an explicit fragment count.
pub fn fragment_command(motor_id: u8, command: &[u8]) -> Vec<(u32, Vec<u8>)> {
    let base_id = (motor_id as u32) << 8;

    if command.len() <= 8 {
        return vec![(base_id, command.to_vec())];
    }

    let function_code = command[0];
    let mut frames = vec![(base_id, command[..8].to_vec())];

    let mut remainder = &command[8..];
    let mut index: u32 = 1;
    while !remainder.is_empty() {
        let take = remainder.len().min(7);
        let mut fragment = Vec::with_capacity(1 + take);
        fragment.push(function_code);
        fragment.extend_from_slice(&remainder[..take]);
        frames.push((base_id + index, fragment));
        remainder = &remainder[take..];
        index += 1;
    }

    frames
}

/// The frame-id a response to `command` is expected on: always the base id,
/// regardless of how many fragments were required to send it.
pub fn response_frame_id(motor_id: u8) -> u32 {
    (motor_id as u32) << 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_command_is_single_frame() {
        let frames = fragment_command(1, &[0xF3, 0xAB, 0x01, 0x00, 0x6B]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, 0x0100);
    }

    #[test]
    fn matches_scenario_s2_fragmentation() {
        let command = [0xFD, 0x00, 0x03, 0xE8, 0x03, 0xE8, 0x13, 0x88, 0x00, 0x00, 0x03, 0x84, 0x01, 0x00, 0x6B];
        let frames = fragment_command(2, &command);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], (0x0200, command[..8].to_vec()));
        assert_eq!(
            frames[1],
            (0x0201, vec![0xFD, 0x00, 0x00, 0x03, 0x84, 0x01, 0x00, 0x6B])
        );
    }

    #[test]
    fn fragment_count_matches_invariant() {
        for len in 9..40 {
            let command = vec![0xAAu8; len];
            let frames = fragment_command(3, &command);
            let expected = (len - 8).div_ceil(7) + 1;
            assert_eq!(frames.len(), expected, "len={len}");
            for (i, (_, data)) in frames.iter().enumerate().skip(1) {
                assert_eq!(data[0], command[0], "fragment {i} missing function code prefix");
            }
            let ids: Vec<u32> = frames.iter().map(|(id, _)| *id).collect();
            let base = ids[0];
            for (i, id) in ids.iter().enumerate() {
                assert_eq!(*id, base + i as u32);
            }
        }
    }
}
