/// Format an amount as Brazilian reais, e.g. `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    if !value.is_finite() {
        return "R$ --".to_string();
    }

    let cents = (value.abs() * 100.0).round() as u64;
    let units = (cents / 100).to_string();
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{sign}R$ {grouped},{:02}", cents % 100)
}
