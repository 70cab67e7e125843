//! Unit conversions shared by the score reader, the oscillator and the mixer.

/// Decibels to linear magnitude: `10^(db/20)`.
pub fn db_to_mag(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Linear magnitude to decibels: `20·log10(mag)`.
pub fn mag_to_db(mag: f64) -> f64 {
    20.0 * mag.log10()
}

/// MIDI note number to frequency at A4 = 440 Hz.
///
/// Negative note numbers are rectified to 0 Hz.
pub fn midi_to_freq(midi: f64) -> f64 {
    if midi < 0.0 {
        0.0
    } else {
        440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
    }
}

/// Linear MIDI velocity to magnitude: 0..=127 maps onto 0..=1.
pub fn midi_to_mag(velocity: f64) -> f64 {
    velocity / 127.0
}

/// Shift a frequency by octaves, semitones and cents.
pub fn transpose(frequency: f64, octaves: f64, semitones: f64, cents: f64) -> f64 {
    let c = 1200.0 * octaves + 100.0 * semitones + cents;
    frequency * 2.0_f64.powf(c / 1200.0)
}

/// Scientific pitch notation to MIDI number, e.g. `("A", 4, 0)` → 69.
///
/// `accidental` is +1 for a sharp and -1 for a flat.
pub fn spn_to_midi(note: &str, octave: i32, accidental: i32) -> Option<i32> {
    let root = match note.to_ascii_lowercase().as_str() {
        "c" => 0,
        "d" => 2,
        "e" => 4,
        "f" => 5,
        "g" => 7,
        "a" => 9,
        "b" => 11,
        _ => return None,
    };
    Some(root + (octave + 1) * 12 + accidental)
}

/// Linear rescale of `x` from `[a0, b0]` onto `[a1, b1]`.
#[inline]
pub fn minmax_scale(x: f64, a0: f64, b0: f64, a1: f64, b1: f64) -> f64 {
    a1 + (x - a0) * (b1 - a1) / (b0 - a0)
}

/// Rescale samples so their minimum lands on -1 and their maximum on 1.
///
/// A constant (or empty) input has no span to stretch and yields zeros.
pub fn normalize(samples: &mut [f64]) {
    let (lo, hi) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    if !(hi > lo) || !(hi - lo).is_finite() {
        samples.iter_mut().for_each(|s| *s = 0.0);
        return;
    }
    for s in samples.iter_mut() {
        *s = minmax_scale(*s, lo, hi, -1.0, 1.0);
    }
}

/// Quantize a float sample in [-1, 1] onto the full i16 range.
///
/// Values outside [-1, 1] saturate at the i16 bounds.
#[inline]
pub fn minmax_scale_i16(sample: f64) -> i16 {
    minmax_scale(sample, -1.0, 1.0, -32768.0, 32767.0) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn decibel_round_trip() {
        assert_approx_eq!(db_to_mag(0.0), 1.0);
        assert_approx_eq!(db_to_mag(-20.0), 0.1);
        assert_approx_eq!(mag_to_db(db_to_mag(-6.0)), -6.0);
    }

    #[test]
    fn midi_reference_pitches() {
        assert_approx_eq!(midi_to_freq(69.0), 440.0);
        assert_approx_eq!(midi_to_freq(81.0), 880.0);
        assert_approx_eq!(midi_to_freq(36.0), 65.406_391_325_149_6, 1e-9);
        assert_eq!(midi_to_freq(-1.0), 0.0);
        assert_approx_eq!(midi_to_mag(127.0), 1.0);
    }

    #[test]
    fn transpose_by_octave_and_cents() {
        assert_approx_eq!(transpose(440.0, 1.0, 0.0, 0.0), 880.0);
        assert_approx_eq!(transpose(440.0, 0.0, 12.0, 0.0), 880.0);
        assert_approx_eq!(transpose(440.0, 0.0, 0.0, -1200.0), 220.0);
    }

    #[test]
    fn spn_lookup() {
        assert_eq!(spn_to_midi("A", 4, 0), Some(69));
        assert_eq!(spn_to_midi("c", 4, 1), Some(61));
        assert_eq!(spn_to_midi("h", 4, 0), None);
    }

    #[test]
    fn normalize_spans_unit_range() {
        let mut s = vec![2.0, 4.0, 3.0];
        normalize(&mut s);
        assert_eq!(s, vec![-1.0, 1.0, 0.0]);

        let mut flat = vec![0.3; 4];
        normalize(&mut flat);
        assert!(flat.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn i16_quantization_bounds() {
        assert_eq!(minmax_scale_i16(-1.0), -32768);
        assert_eq!(minmax_scale_i16(1.0), 32767);
        assert_eq!(minmax_scale_i16(4.0), i16::MAX);
        assert_eq!(minmax_scale_i16(-4.0), i16::MIN);
    }
}
