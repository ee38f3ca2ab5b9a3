/// Human-readable shift with Hz / kHz / MHz scaling at the 10^3 / 10^6 thresholds.
pub fn format_doppler_shift(shift_hz: f64) -> String {
    let magnitude = shift_hz.abs();
    if magnitude >= 1e6 {
        format!("{:.3} MHz", shift_hz / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.3} kHz", shift_hz / 1e3)
    } else {
        format!("{:.3} Hz", shift_hz)
    }
}
