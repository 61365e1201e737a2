/// Build-time switches of a [`Builder`].
///
/// [`Builder`]: crate::Builder
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// Close arrays opened as indexed through the compact encoding first.
    pub build_unindexed_arrays: bool,

    /// Close objects opened as indexed through the compact encoding first.
    /// Single-pair objects take the compact path regardless.
    pub build_unindexed_objects: bool,

    /// Compare attribute names on hash collisions during object close and
    /// fail with [`Error::DuplicateAttributeName`] on a repeat.
    ///
    /// [`Error::DuplicateAttributeName`]: crate::Error::DuplicateAttributeName
    pub check_attribute_uniqueness: bool,

    /// Refuse to encode external values. On by default; externals embed a
    /// raw host pointer and are not portable.
    pub disallow_externals: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            build_unindexed_arrays: false,
            build_unindexed_objects: false,
            check_attribute_uniqueness: false,
            disallow_externals: true,
        }
    }
}
