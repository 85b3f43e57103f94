use std::path::PathBuf;

/// Anything that can tell the pipeline which roots the user picked.
pub trait SelectionSource {
    fn selected_roots(&self) -> Vec<PathBuf>;
}

/// A fixed selection, e.g. paths given on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticSelection {
    roots: Vec<PathBuf>,
}

impl StaticSelection {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        StaticSelection {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl SelectionSource for StaticSelection {
    fn selected_roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }
}
