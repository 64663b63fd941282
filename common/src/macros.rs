/// Build a `PathBuf` out of a list of components.
///
/// ```
/// use std::path::PathBuf;
/// use skytrack_common::makepath;
///
/// let p: PathBuf = makepath!("/home", ".config", "skytrack");
/// assert_eq!(PathBuf::from("/home/.config/skytrack"), p);
/// ```
///
#[macro_export]
macro_rules! makepath {
    ($($item:expr),+) => {
        [
        $(::std::path::PathBuf::from($item),)+
        ]
        .iter()
        .collect::<::std::path::PathBuf>()
    };
}
