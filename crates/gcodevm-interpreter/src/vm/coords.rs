//! Coordinate system conversion
//!
//! `convert_coord_sys` is the single place work and machine frames are
//! translated. A frame is described by an optional coordinate-system index
//! and an optional override offset (the G92 offset when it is enabled).
//! `None` for the system means no coordinate-system offset applies, which is
//! how the machine frame is expressed.

use super::state::VmState;

/// Translate `pos` from one frame into another
///
/// Per axis, offsets of the source frame are added back and offsets of the
/// destination frame are removed: `machine = work + sys_offset + g92_offset`.
pub fn convert_coord_sys(
    state: &VmState,
    pos: &[f64],
    from_sys: Option<usize>,
    to_sys: Option<usize>,
    from_offset: Option<&[f64]>,
    to_offset: Option<&[f64]>,
) -> Vec<f64> {
    let component = |values: Option<&[f64]>, axis: usize| {
        values.and_then(|v| v.get(axis)).copied().unwrap_or(0.0)
    };
    let system = |index: Option<usize>| {
        index
            .and_then(|i| state.coord_sys_offsets.get(i))
            .map(Vec::as_slice)
    };

    let from_sys = system(from_sys);
    let to_sys = system(to_sys);

    pos.iter()
        .enumerate()
        .map(|(axis, value)| {
            let from_total = component(from_sys, axis) + component(from_offset, axis);
            let to_total = component(to_sys, axis) + component(to_offset, axis);
            value + from_total - to_total
        })
        .collect()
}

impl VmState {
    /// Coordinate system and override offset that define the work frame
    pub fn work_frame(&self) -> (Option<usize>, Option<&[f64]>) {
        let offset = self.offset_enabled.then_some(self.offset.as_slice());
        (Some(self.active_coord_sys), offset)
    }

    /// Convert a work position into machine coordinates
    pub fn to_machine(&self, pos: &[f64]) -> Vec<f64> {
        let (sys, offset) = self.work_frame();
        convert_coord_sys(self, pos, sys, None, offset, None)
    }

    /// Convert a machine position into work coordinates
    pub fn to_work(&self, mpos: &[f64]) -> Vec<f64> {
        let (sys, offset) = self.work_frame();
        convert_coord_sys(self, mpos, None, sys, None, offset)
    }

    /// Work-frame targets for axis words given in machine coordinates (G53)
    ///
    /// Axes without a word stay `None`.
    pub fn machine_words_to_work(&self, words: &[Option<f64>]) -> Vec<Option<f64>> {
        let target: Vec<f64> = words
            .iter()
            .zip(&self.mpos)
            .map(|(word, mpos)| word.unwrap_or(*mpos))
            .collect();
        self.to_work(&target)
            .into_iter()
            .zip(words)
            .map(|(value, word)| word.map(|_| value))
            .collect()
    }

    /// Recompute `mpos` after `pos` changed
    pub fn update_mpos_from_pos(&mut self) {
        self.mpos = self.to_machine(&self.pos);
    }

    /// Recompute `pos` after `mpos` or the active frame changed
    pub fn update_pos_from_mpos(&mut self) {
        self.pos = self.to_work(&self.mpos);
    }

    /// Switch the active coordinate system, keeping the machine still
    ///
    /// Returns false and leaves the state alone for an index outside 0..=5.
    pub fn set_coord_sys(&mut self, index: usize) -> bool {
        if index >= self.coord_sys_offsets.len() {
            return false;
        }
        self.active_coord_sys = index;
        self.update_pos_from_mpos();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::config::VmConfig;

    fn state() -> VmState {
        let mut state = VmState::new(&VmConfig::default()).unwrap();
        state.coord_sys_offsets[0] = vec![10.0, 20.0, -30.0];
        state.coord_sys_offsets[2] = vec![-5.0, 0.0, 1.5];
        state
    }

    #[test]
    fn test_work_to_machine() {
        let state = state();
        let mpos = convert_coord_sys(&state, &[1.0, 2.0, 3.0], Some(0), None, None, None);
        assert_eq!(mpos, vec![11.0, 22.0, -27.0]);
    }

    #[test]
    fn test_between_systems() {
        let state = state();
        let pos = convert_coord_sys(&state, &[1.0, 2.0, 3.0], Some(0), Some(2), None, None);
        assert_eq!(pos, vec![16.0, 22.0, -28.5]);
    }

    #[test]
    fn test_override_offsets() {
        let state = state();
        let g92 = [1.0, 1.0, 1.0];
        let mpos = convert_coord_sys(&state, &[0.0, 0.0, 0.0], None, None, Some(&g92), None);
        assert_eq!(mpos, vec![1.0, 1.0, 1.0]);
        let back = convert_coord_sys(&state, &mpos, None, None, None, Some(&g92));
        assert_eq!(back, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_g92_applies_only_when_enabled() {
        let mut state = state();
        state.offset = vec![2.0, 2.0, 2.0];
        state.mpos = vec![12.0, 22.0, -28.0];

        state.update_pos_from_mpos();
        assert_eq!(state.pos, vec![2.0, 2.0, 2.0]);

        state.offset_enabled = true;
        state.update_pos_from_mpos();
        assert_eq!(state.pos, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_machine_words_to_work() {
        let mut state = state();
        state.offset_enabled = true;
        state.offset = vec![2.0, 2.0, 2.0];
        let targets = state.machine_words_to_work(&[Some(5.0), None, Some(0.0)]);
        assert_eq!(targets, vec![Some(-7.0), None, Some(28.0)]);
    }

    #[test]
    fn test_set_coord_sys_keeps_machine_position() {
        let mut state = state();
        state.mpos = vec![10.0, 20.0, -30.0];
        state.update_pos_from_mpos();
        assert_eq!(state.pos, vec![0.0, 0.0, 0.0]);

        assert!(state.set_coord_sys(2));
        assert_eq!(state.mpos, vec![10.0, 20.0, -30.0]);
        assert_eq!(state.pos, vec![15.0, 20.0, -31.5]);

        assert!(!state.set_coord_sys(6));
        assert_eq!(state.active_coord_sys, 2);
    }
}
