use super::Value;

/// Format a value for display. The empty value renders as an empty string.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Empty => String::new(),
        Value::Number(n) => format_number(*n),
        Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Value::Text(s) => s.clone(),
        Value::Builtin(f) => format!("<built-in function {}>", f.name),
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "#INF!" } else { "-#INF!" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else if n != 0.0 && (n.abs() >= 1e15 || n.abs() < 1e-6) {
        format!("{:e}", n)
    } else {
        n.to_string()
    }
}
