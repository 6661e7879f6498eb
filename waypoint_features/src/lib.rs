/// Structure containing all behavior flags of the binding engine.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Features {
    /// Whether compiler mappings (source maps) are installed when a unit is parsed.
    pub source_maps: bool,

    /// Whether a pause is suppressed when the top frame sits at a location its unit's most
    /// specific mapping cannot resolve.
    pub suppress_unmapped_pauses: bool,
}

impl Features {
    /// Returns the default flag set. Same as `Default::default`.
    pub fn new() -> Self {
        Features {
            source_maps: true,
            suppress_unmapped_pauses: true,
        }
    }

    /// Returns a flag set that installs source maps but stops on every pause.
    pub fn basic() -> Self {
        Features {
            source_maps: true,
            suppress_unmapped_pauses: false,
        }
    }

    /// Returns a flag set with everything disabled. Units are only ever shown through
    /// their identity mapping.
    pub fn none() -> Self {
        Features {
            source_maps: false,
            suppress_unmapped_pauses: false,
        }
    }

    /// Returns a flag set with everything enabled.
    pub fn all() -> Self {
        Features {
            source_maps: true,
            suppress_unmapped_pauses: true,
        }
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_suppresses_unmapped_pauses() {
        let features = Features::default();
        assert!(features.source_maps);
        assert!(features.suppress_unmapped_pauses);
        assert_eq!(Features::new(), features);
    }

    #[test]
    fn basic_never_suppresses() {
        assert!(!Features::basic().suppress_unmapped_pauses);
        assert!(!Features::none().source_maps);
    }
}
