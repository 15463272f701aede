// Builder methods shared by every field type that carries a `base: FieldBase`.
// Method-backed fields are left out on purpose since they cannot take a default.

macro_rules! impl_field_options {
    ($($ty:ty),+ $(,)?) => {$(
        impl $ty {
            /// Reject null values (and empty collections, for collection fields)
            pub fn required(mut self) -> Self {
                self.base.options.required = true;
                self
            }

            /// Value materialized on first read when nothing was assigned
            pub fn default(mut self, value: impl Into<$crate::value::Value>) -> Self {
                self.base.options.default = Some($crate::field::DefaultValue::Value(value.into()));
                self
            }

            /// Producer called on first read when nothing was assigned
            pub fn default_with<F>(mut self, factory: F) -> Self
            where
                F: Fn() -> $crate::value::Value + 'static,
            {
                self.base.options.default =
                    Some($crate::field::DefaultValue::Factory(std::rc::Rc::new(factory)));
                self
            }

            /// Extra check run after the field's own coercion
            pub fn validator<F>(mut self, validator: F) -> Self
            where
                F: Fn(
                        &$crate::config::Config,
                        $crate::value::FieldValue,
                    ) -> Result<$crate::value::FieldValue, $crate::error::ConfigError>
                    + 'static,
            {
                self.base.options.validator = Some(std::rc::Rc::new(validator));
                self
            }

            /// Name used in error messages instead of the key
            pub fn display_name(mut self, name: impl Into<String>) -> Self {
                self.base.options.name = Some(name.into());
                self
            }

            /// Human-readable description used in generated docs
            pub fn description(mut self, description: impl Into<String>) -> Self {
                self.base.options.description = Some(description.into());
                self
            }

            /// Replace all common options at once
            pub fn options(mut self, options: $crate::field::FieldOptions) -> Self {
                self.base.options = options;
                self
            }
        }
    )+};
}
