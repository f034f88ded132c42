// 小数のまま保持し、丸めは表示時のみ
pub fn compute_price(hourly_rate: f64, duration_minutes: u32) -> f64 {
    hourly_rate / 60.0 * duration_minutes as f64
}

pub fn compute_price_opt(hourly_rate: f64, duration_minutes_opt: Option<u32>) -> f64 {
    duration_minutes_opt
        .map(|minutes| compute_price(hourly_rate, minutes))
        .unwrap_or(0.0)
}

pub fn format_price(price: f64) -> String {
    format!("₹{}", price.round() as i64)
}

#[cfg(test)]
fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_compute_price_1200円で90分() {
    assert!(approx_eq(compute_price(1200.0, 90), 1800.0));
}

#[test]
fn test_compute_price_60分は時間単価と等しい() {
    for rate in [0.0, 1.0, 999.5, 1200.0, 3000.0] {
        assert!(approx_eq(compute_price(rate, 60), rate));
    }
}

#[test]
fn test_compute_price_0分は0() {
    assert_eq!(compute_price(1200.0, 0), 0.0);
}

#[test]
fn test_compute_price_時間に対して線形() {
    for minutes in [30, 45, 90, 150] {
        let single = compute_price(1050.0, minutes);
        let double = compute_price(1050.0, minutes * 2);
        assert!(approx_eq(double, single * 2.0));
    }
}

#[test]
fn test_compute_price_端数を保持する() {
    assert!(approx_eq(compute_price(1000.0, 30), 500.0));
    assert!(approx_eq(compute_price(999.0, 30), 499.5));
}

#[test]
fn test_compute_price_opt_未選択は0() {
    assert_eq!(compute_price_opt(1200.0, None), 0.0);
    assert!(approx_eq(compute_price_opt(1200.0, Some(120)), 2400.0));
}

#[test]
fn test_format_price() {
    assert_eq!(format_price(1800.0), "₹1800");
    assert_eq!(format_price(499.5), "₹500");
}
