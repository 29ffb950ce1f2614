//! Byte frequency spectrum and the sources that produce it.

/// Per-bin magnitudes in 0..=255, one entry per frequency bin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencySpectrum {
    bins: Vec<u8>,
}

impl FrequencySpectrum {
    /// All-zero spectrum with `bin_count` bins
    pub fn new(bin_count: usize) -> Self {
        Self::filled(bin_count, 0)
    }

    pub fn filled(bin_count: usize, value: u8) -> Self {
        Self {
            bins: vec![value; bin_count],
        }
    }

    pub fn from_bins(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Magnitude of bin `index`; bins past the end read as silence
    pub fn bin(&self, index: usize) -> u8 {
        self.bins.get(index).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bins
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bins
    }
}

/// Anything that can hand out the current spectrum
pub trait SpectrumSource {
    /// Snapshot of the latest spectrum
    fn frequencies(&self) -> FrequencySpectrum;
}

/// Spectrum that never changes
#[derive(Debug, Clone, Default)]
pub struct FixedSpectrum(pub FrequencySpectrum);

impl SpectrumSource for FixedSpectrum {
    fn frequencies(&self) -> FrequencySpectrum {
        self.0.clone()
    }
}
