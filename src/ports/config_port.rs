//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn has_section(&self, section: &str) -> bool {
        self.keys(section).is_some()
    }

    /// Keys present in `section`, sorted; `None` if the section is absent.
    fn keys(&self, section: &str) -> Option<Vec<String>>;
}
