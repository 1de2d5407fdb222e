use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid triple '{0}'. Expected three numbers such as '(10.5,-3,7)'.")]
    InvalidTriple(String),

    #[error("Component '{component}' of '{value}' must be a finite number.")]
    NonFinite { component: String, value: String },

    #[error("Box size '{0}' must have positive components.")]
    NonPositiveSize(String),
}

/// Parses `"(x,y,z)"`, `"x,y,z"` or `"[x, y, z]"` into three finite numbers.
pub fn parse_triple(value: &str) -> Result<[f64; 3], ParseError> {
    let inner = value
        .trim()
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']']);
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(ParseError::InvalidTriple(value.to_string()));
    };
    let mut out = [0.0; 3];
    for (slot, component) in out.iter_mut().zip([x, y, z]) {
        let number: f64 = component
            .parse()
            .map_err(|_| ParseError::InvalidTriple(value.to_string()))?;
        if !number.is_finite() {
            return Err(ParseError::NonFinite {
                component: component.to_string(),
                value: value.to_string(),
            });
        }
        *slot = number;
    }
    Ok(out)
}

/// Like [`parse_triple`], additionally requiring every component to be positive.
pub fn parse_box_size(value: &str) -> Result<[f64; 3], ParseError> {
    let size = parse_triple(value)?;
    if size.iter().any(|v| *v <= 0.0) {
        return Err(ParseError::NonPositiveSize(value.to_string()));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_triple_spellings() {
        assert_eq!(parse_triple("(1,2,3)").unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(parse_triple(" -1.5, 0 ,2e1 ").unwrap(), [-1.5, 0.0, 20.0]);
        assert_eq!(parse_triple("[4, 5, 6]").unwrap(), [4.0, 5.0, 6.0]);
    }

    #[test]
    fn rejects_malformed_triples() {
        assert_eq!(
            parse_triple("(1,2)"),
            Err(ParseError::InvalidTriple("(1,2)".to_string()))
        );
        assert!(matches!(parse_triple("(a,b,c)"), Err(ParseError::InvalidTriple(_))));
        assert!(matches!(parse_triple("(1,inf,3)"), Err(ParseError::NonFinite { .. })));
        assert!(matches!(parse_triple("(1,NaN,3)"), Err(ParseError::NonFinite { .. })));
    }

    #[test]
    fn box_size_must_be_positive() {
        assert_eq!(parse_box_size("(20,20,20)").unwrap(), [20.0; 3]);
        assert!(matches!(parse_box_size("(20,0,20)"), Err(ParseError::NonPositiveSize(_))));
    }
}
