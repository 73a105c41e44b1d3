/// Limits shared by the injector, the rule engine and the binder.
///
/// Recursion into nested records is bounded by `max_depth`. A record type
/// that nests itself (directly or through `Option<Box<_>>`) would otherwise
/// never terminate during default injection, which allocates missing
/// nested records before descending into them.
///
/// # Examples
///
/// ```
/// use bind_core::EngineConfig;
///
/// let config = EngineConfig::new(8);
/// assert_eq!(config.max_depth(), 8);
///
/// assert_eq!(EngineConfig::default().max_depth(), 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    max_depth: usize,
}

impl EngineConfig {
    /// Depth used by [`EngineConfig::default_limits`].
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    /// Creates a configuration with the given nesting limit.
    ///
    /// The root record is depth 0; each nested record adds one.
    ///
    /// # Panics
    ///
    /// Panics if `max_depth` is 0.
    pub fn new(max_depth: usize) -> Self {
        assert!(max_depth > 0, "max_depth must be greater than 0");
        Self { max_depth }
    }

    /// Configuration with the default nesting limit of 32.
    pub fn default_limits() -> Self {
        Self::new(Self::DEFAULT_MAX_DEPTH)
    }

    /// Maximum nesting depth below the root record.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::default_limits()
    }
}
