//! 缓动函数

/// 缓动类型（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// t ∈ [0, 1]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Easing::Linear),
            "easeIn" | "ease-in" => Some(Easing::EaseIn),
            "easeOut" | "ease-out" => Some(Easing::EaseOut),
            "easeInOut" | "ease-in-out" => Some(Easing::EaseInOut),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_values() {
        assert_eq!(Easing::Linear.apply(0.3), 0.3);
        assert_eq!(Easing::EaseIn.apply(0.5), 0.25);
        assert_eq!(Easing::EaseOut.apply(0.5), 0.75);
        assert_eq!(Easing::EaseInOut.apply(0.25), 0.125);
        assert_eq!(Easing::EaseInOut.apply(0.75), 0.875);
        for e in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(e.apply(0.0), 0.0);
            assert_eq!(e.apply(1.0), 1.0);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Easing::from_name("ease-in-out"), Some(Easing::EaseInOut));
        assert_eq!(Easing::from_name("bounce"), None);
    }
}
