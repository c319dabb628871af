//! Canonicalization of raw tag values
//!
//! Stateless and kind-agnostic: every normalizer maps raw values through
//! these functions. Each returns `None` for values it does not recognize,
//! which drops the key from the normalized output.

use serde_json::Value;

/// Converts one raw tag value into its normalized JSON value
pub type Converter = fn(&str) -> Option<Value>;

/// Canonical surface, folding common synonyms
pub fn surface(value: &str) -> Option<&'static str> {
    match value {
        "asphalt" => Some("asphalt"),
        "concrete" | "concrete:plates" | "concrete:lanes" => Some("concrete"),
        "paving_stones" | "sett" | "cobblestone" | "unhewn_cobblestone" | "bricks" => Some("paving_stones"),
        "gravel" | "fine_gravel" | "pebblestone" | "compacted" => Some("gravel"),
        "grass" => Some("grass"),
        "grass_paver" => Some("grass_paver"),
        "dirt" | "earth" | "ground" | "mud" | "sand" => Some("dirt"),
        "paved" => Some("paved"),
        "unpaved" => Some("unpaved"),
        "wood" => Some("wood"),
        _ => None,
    }
}

/// Crossing control collapsed to `marked`/`unmarked`
pub fn crossing(value: &str) -> Option<&'static str> {
    match value {
        "marked" | "uncontrolled" | "traffic_signals" | "zebra" => Some("marked"),
        "unmarked" => Some("unmarked"),
        _ => None,
    }
}

/// Crossing markings style
pub fn crossing_markings(value: &str) -> Option<&'static str> {
    match value {
        "dashes" => Some("dashes"),
        "dots" => Some("dots"),
        "ladder" => Some("ladder"),
        "ladder:paired" => Some("ladder:paired"),
        "ladder:skewed" => Some("ladder:skewed"),
        "lines" => Some("lines"),
        "lines:paired" => Some("lines:paired"),
        "lines:rainbow" => Some("lines:rainbow"),
        "pictograms" => Some("pictograms"),
        "rainbow" => Some("rainbow"),
        "skewed" => Some("skewed"),
        "surface" => Some("surface"),
        "zebra" => Some("zebra"),
        "zebra:bicolour" => Some("zebra:bicolour"),
        "zebra:double" => Some("zebra:double"),
        "zebra:paired" => Some("zebra:paired"),
        "zebra:rainbow" => Some("zebra:rainbow"),
        "yes" => Some("yes"),
        "no" => Some("no"),
        _ => None,
    }
}

/// `yes`/`contrasted` are tactile, `no` is not, anything else is unknown
pub fn tactile_paving(value: &str) -> Option<bool> {
    match value {
        "yes" | "contrasted" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

/// Direction of travel on stairs
pub fn climb(value: &str) -> Option<&'static str> {
    match value {
        "up" | "upward" | "uphill" => Some("up"),
        "down" | "downward" | "downhill" => Some("down"),
        _ => None,
    }
}

/// Incline as a direction token, or as a grade when numeric (`"8%"` gives `0.08`)
pub fn incline(value: &str) -> Option<Value> {
    if let Some(direction) = climb(value) {
        return Some(Value::from(direction));
    }

    let grade = match value.trim().strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().ok()? / 100.0,
        None => value.trim().parse::<f64>().ok()?,
    };
    (grade.is_finite() && (-1.0..=1.0).contains(&grade)).then(|| Value::from(grade))
}

pub fn text(value: &str) -> Option<Value> {
    Some(Value::from(value))
}

/// Floating point value, ignoring a trailing ` m` unit
pub fn float(value: &str) -> Option<Value> {
    let number = value.trim().trim_end_matches('m').trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::from)
}

pub fn int(value: &str) -> Option<Value> {
    value.trim().parse::<i64>().ok().map(Value::from)
}

pub fn surface_value(value: &str) -> Option<Value> {
    surface(value).map(Value::from)
}

pub fn crossing_value(value: &str) -> Option<Value> {
    crossing(value).map(Value::from)
}

pub fn crossing_markings_value(value: &str) -> Option<Value> {
    crossing_markings(value).map(Value::from)
}

pub fn tactile_paving_value(value: &str) -> Option<Value> {
    tactile_paving(value).map(Value::from)
}

pub fn climb_value(value: &str) -> Option<Value> {
    climb(value).map(Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tactile_paving() {
        assert_eq!(tactile_paving("yes"), Some(true));
        assert_eq!(tactile_paving("contrasted"), Some(true));
        assert_eq!(tactile_paving("no"), Some(false));
        assert_eq!(tactile_paving("invalid_value"), None);
    }

    #[test]
    fn test_surface() {
        assert_eq!(surface("asphalt"), Some("asphalt"));
        assert_eq!(surface("concrete"), Some("concrete"));
        assert_eq!(surface("concrete:plates"), Some("concrete"));
        assert_eq!(surface("sett"), Some("paving_stones"));
        assert_eq!(surface("invalid_value"), None);
    }

    #[test]
    fn test_crossing() {
        for marked in ["marked", "uncontrolled", "traffic_signals", "zebra"] {
            assert_eq!(crossing(marked), Some("marked"));
        }
        assert_eq!(crossing("unmarked"), Some("unmarked"));
        assert_eq!(crossing("invalid_value"), None);
    }

    #[test]
    fn test_crossing_markings() {
        assert_eq!(crossing_markings("dashes"), Some("dashes"));
        assert_eq!(crossing_markings("dots"), Some("dots"));
        assert_eq!(crossing_markings("invalid_value"), None);
    }

    #[test]
    fn test_incline() {
        assert_eq!(incline("up"), Some(json!("up")));
        assert_eq!(incline("down"), Some(json!("down")));
        assert_eq!(incline("10%"), Some(json!(0.1)));
        assert_eq!(incline("-0.05"), Some(json!(-0.05)));
        assert_eq!(incline("250%"), None);
        assert_eq!(incline("invalid_value"), None);
    }

    #[test]
    fn test_numeric_parsing() {
        assert_eq!(float("1.5"), Some(json!(1.5)));
        assert_eq!(float("2 m"), Some(json!(2.0)));
        assert_eq!(float("wide"), None);
        assert_eq!(int("12"), Some(json!(12)));
        assert_eq!(int("12.5"), None);
    }
}
