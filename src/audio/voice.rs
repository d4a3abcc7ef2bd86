use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use crate::audio_api::SampleId;

// one playing instance of a sample; several can share the same sample
#[derive(Clone, Debug)]
pub struct Voice {
    pub sample_id: SampleId,
    pub gain: f32,
    pub active: bool,
    pos: usize,
}

impl Voice {
    pub fn new(sample_id: SampleId, gain: f32) -> Self {
        Self {
            sample_id,
            gain,
            active: true,
            pos: 0,
        }
    }

    // add this voice on top of whatever is already in `out`
    pub fn render_into(&mut self, buffer: &SampleBuffer, out: &mut [StereoFrame]) {
        if !self.active {
            return;
        }
        let remaining = buffer.data.get(self.pos..).unwrap_or(&[]);
        let n = remaining.len().min(out.len());
        for (dst, src) in out.iter_mut().zip(&remaining[..n]) {
            dst.mix(*src, self.gain);
        }
        self.pos += n;
        if self.pos >= buffer.data.len() {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> SampleBuffer {
        SampleBuffer {
            data: (0..len).map(|i| StereoFrame::mono(i as f32)).collect(),
        }
    }

    #[test]
    fn renders_across_blocks_then_finishes() {
        let buffer = ramp(6);
        let mut voice = Voice::new(SampleId(0), 1.0);

        let mut block = [StereoFrame::zero(); 4];
        voice.render_into(&buffer, &mut block);
        assert_eq!(block[3], StereoFrame::mono(3.0));
        assert!(voice.active);

        let mut block = [StereoFrame::zero(); 4];
        voice.render_into(&buffer, &mut block);
        assert_eq!(block[0], StereoFrame::mono(4.0));
        assert_eq!(block[1], StereoFrame::mono(5.0));
        assert_eq!(block[2], StereoFrame::zero());
        assert!(!voice.active);
    }

    #[test]
    fn gain_scales_and_sums() {
        let buffer = ramp(2);
        let mut voice = Voice::new(SampleId(0), 0.5);
        let mut block = [StereoFrame::mono(1.0); 2];
        voice.render_into(&buffer, &mut block);
        assert_eq!(block[1], StereoFrame::mono(1.5));
    }

    #[test]
    fn empty_sample_ends_immediately() {
        let mut voice = Voice::new(SampleId(0), 1.0);
        voice.render_into(&SampleBuffer { data: vec![] }, &mut [StereoFrame::zero(); 4]);
        assert!(!voice.active);
    }
}
