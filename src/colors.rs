use crate::category::CategoryGroup;
use crate::dataset::BrandType;

/// Dependency-injection seam for category color mapping.
///
/// Implement this trait to provide custom color themes. The built-in
/// implementation is [`DefaultTheme`].
pub trait CategoryTheme: Send + Sync {
    /// Terminal color name accepted by the `colored` crate (e.g. `"red"`).
    fn terminal_color(&self, group: CategoryGroup) -> &'static str;

    /// Color for an individual brand row, keyed by its category.
    fn brand_color(&self, brand_type: BrandType) -> &'static str {
        self.terminal_color(brand_type.into())
    }
}

/// Domestic brands in red, international in blue, the rest white.
pub struct DefaultTheme;

impl CategoryTheme for DefaultTheme {
    fn terminal_color(&self, group: CategoryGroup) -> &'static str {
        match group {
            CategoryGroup::DomesticTotal      => "red",
            CategoryGroup::InternationalTotal => "blue",
            CategoryGroup::Other              => "white",
        }
    }
}
