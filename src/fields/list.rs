use crate::config::{Config, WeakConfig};
use crate::error::ConfigError;
use crate::field::{Field, FieldBase, FieldOptions};
use crate::schema::Schema;
use crate::value::{FieldValue, Value};
use std::{cell::RefCell, cmp::Ordering, fmt, rc::Rc};

/// What list elements are validated against
#[derive(Debug, Clone)]
pub enum ItemValidator {
    /// No per-element check
    Any,
    Field(Rc<dyn Field>),
    /// Elements are configs of this schema
    Schema(Schema),
}

impl ItemValidator {
    pub fn field<F: Field + 'static>(field: F) -> Self {
        ItemValidator::Field(Rc::new(field))
    }

    pub fn schema(schema: &Schema) -> Self {
        ItemValidator::Schema(schema.clone())
    }

    pub fn kind(&self) -> String {
        match self {
            ItemValidator::Any => "any".to_string(),
            ItemValidator::Field(field) => field.kind(),
            ItemValidator::Schema(schema) => schema.key().unwrap_or("config").to_string(),
        }
    }

    /// Identity comparison: same field object or same schema object
    pub fn ptr_eq(&self, other: &ItemValidator) -> bool {
        match (self, other) {
            (ItemValidator::Any, ItemValidator::Any) => true,
            (ItemValidator::Field(a), ItemValidator::Field(b)) => Rc::ptr_eq(a, b),
            (ItemValidator::Schema(a), ItemValidator::Schema(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn validate(&self, owner: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        match self {
            ItemValidator::Any => Ok(value),
            ItemValidator::Field(field) => field.validate(owner, value),
            ItemValidator::Schema(schema) => schema.coerce(owner, value).map(FieldValue::Config),
        }
    }

    pub fn to_basic(&self, owner: &Config, value: &FieldValue) -> Result<Value, ConfigError> {
        match self {
            ItemValidator::Field(field) => field.to_basic(owner, value),
            ItemValidator::Any | ItemValidator::Schema(_) => value.to_basic(),
        }
    }
}

/// A list whose every element has passed the item validator
///
/// `ListProxy` is a handle: clones share the same items, like the list stored in
/// the config. Use [`ListProxy::copy`] for an independent list.
#[derive(Clone)]
pub struct ListProxy {
    cfg: WeakConfig,
    validator: ItemValidator,
    items: Rc<RefCell<Vec<FieldValue>>>,
}

impl ListProxy {
    /// Validates `items` one by one into a new list bound to `cfg`
    pub fn new<I>(cfg: &Config, validator: ItemValidator, items: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        let list = Self::empty(cfg, validator);
        list.extend(items)?;
        Ok(list)
    }

    pub fn empty(cfg: &Config, validator: ItemValidator) -> Self {
        Self {
            cfg: cfg.downgrade(),
            validator,
            items: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The owning config, if it is still alive
    pub fn config(&self) -> Option<Config> {
        self.cfg.upgrade()
    }

    pub fn validator(&self) -> &ItemValidator {
        &self.validator
    }

    fn owner(&self) -> Result<Config, ConfigError> {
        self.cfg.upgrade().ok_or(ConfigError::Detached)
    }

    // Every insertion path goes through here.
    fn validate_item(&self, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let owner = self.owner()?;
        self.validator.validate(&owner, value)
    }

    fn label(&self) -> String {
        format!("list[{}]", self.validator.kind())
    }

    fn check_index(&self, index: usize) -> Result<(), ConfigError> {
        let len = self.len();
        if index >= len {
            return Err(ConfigError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Result<FieldValue, ConfigError> {
        self.items
            .borrow()
            .get(index)
            .cloned()
            .ok_or(ConfigError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    /// Replaces the item at `index` with the validated `value`
    pub fn set(&self, index: usize, value: impl Into<FieldValue>) -> Result<(), ConfigError> {
        self.check_index(index)?;
        let value = self.validate_item(value.into())?;
        self.items.borrow_mut()[index] = value;
        Ok(())
    }

    pub fn append(&self, value: impl Into<FieldValue>) -> Result<(), ConfigError> {
        let value = self.validate_item(value.into())?;
        self.items.borrow_mut().push(value);
        Ok(())
    }

    /// Inserts before `index`; an index past the end appends
    pub fn insert(&self, index: usize, value: impl Into<FieldValue>) -> Result<(), ConfigError> {
        let value = self.validate_item(value.into())?;
        let mut items = self.items.borrow_mut();
        let index = index.min(items.len());
        items.insert(index, value);
        Ok(())
    }

    /// Appends every item; nothing is added unless all of them validate
    pub fn extend<I>(&self, items: I) -> Result<(), ConfigError>
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        let validated = items
            .into_iter()
            .map(|item| self.validate_item(item.into()))
            .collect::<Result<Vec<_>, _>>()?;
        self.items.borrow_mut().extend(validated);
        Ok(())
    }

    /// A new list with this list's items followed by `other`, same owner and validator
    pub fn concat<I>(&self, other: I) -> Result<ListProxy, ConfigError>
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        let combined = self.copy();
        combined.extend(other)?;
        Ok(combined)
    }

    /// Removes and returns the item at `index`, or the last item
    pub fn pop(&self, index: Option<usize>) -> Result<FieldValue, ConfigError> {
        let len = self.len();
        let index = match index {
            Some(index) => index,
            None if len > 0 => len - 1,
            None => return Err(ConfigError::IndexOutOfRange { index: 0, len }),
        };
        self.check_index(index)?;
        Ok(self.items.borrow_mut().remove(index))
    }

    /// Deletes the item at `index`
    pub fn remove_at(&self, index: usize) -> Result<(), ConfigError> {
        self.pop(Some(index)).map(|_| ())
    }

    /// Removes the first item equal to `value`
    pub fn remove(&self, value: impl Into<FieldValue>) -> Result<(), ConfigError> {
        let index = self.index(value)?;
        self.items.borrow_mut().remove(index);
        Ok(())
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    pub fn reverse(&self) {
        self.items.borrow_mut().reverse();
    }

    /// Sorts by natural order
    ///
    /// Every item must be a basic value of one kind (ints and floats mix); NaN sorts
    /// after all other numbers. Otherwise the list is left as is and a `Type` error
    /// names the kinds that clash.
    pub fn sort(&self, reverse: bool) -> Result<(), ConfigError> {
        {
            let items = self.items.borrow();
            let mut kind: Option<&'static str> = None;
            for item in items.iter() {
                let item_kind = match item {
                    FieldValue::Basic(value) if !matches!(value, Value::Map(_)) => value.sort_kind(),
                    other => {
                        return Err(ConfigError::type_error(
                            self.label(),
                            format!("cannot sort items of type {}", other.type_name()),
                        ))
                    }
                };
                match kind {
                    Some(seen) if seen != item_kind => {
                        return Err(ConfigError::type_error(
                            self.label(),
                            format!("cannot sort {} and {} items together", seen, item_kind),
                        ))
                    }
                    _ => kind = Some(item_kind),
                }
            }
        }

        self.sort_by(|a, b| {
            let ordering = match (a, b) {
                (FieldValue::Basic(a), FieldValue::Basic(b)) => a.total_cmp(b),
                _ => Ordering::Equal,
            };
            if reverse {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(())
    }

    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&FieldValue, &FieldValue) -> Ordering,
    {
        self.items.borrow_mut().sort_by(compare);
    }

    // Lookups compare against the validated form when the value validates.
    fn needle(&self, value: FieldValue) -> FieldValue {
        match &self.validator {
            ItemValidator::Schema(_) => value,
            _ => self.validate_item(value.clone()).unwrap_or(value),
        }
    }

    pub fn count(&self, value: impl Into<FieldValue>) -> usize {
        let needle = self.needle(value.into());
        self.items.borrow().iter().filter(|item| **item == needle).count()
    }

    /// Position of the first item equal to `value`
    pub fn index(&self, value: impl Into<FieldValue>) -> Result<usize, ConfigError> {
        let needle = self.needle(value.into());
        self.items
            .borrow()
            .iter()
            .position(|item| *item == needle)
            .ok_or_else(|| ConfigError::NotInList {
                value: needle
                    .to_basic()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|_| needle.type_name().to_string()),
            })
    }

    pub fn contains(&self, value: impl Into<FieldValue>) -> bool {
        self.count(value) > 0
    }

    /// Snapshot iterator over the current items
    pub fn iter(&self) -> std::vec::IntoIter<FieldValue> {
        self.to_vec().into_iter()
    }

    pub fn to_vec(&self) -> Vec<FieldValue> {
        self.items.borrow().clone()
    }

    /// Independent list with the same owner, validator and items
    pub fn copy(&self) -> ListProxy {
        ListProxy {
            cfg: self.cfg.clone(),
            validator: self.validator.clone(),
            items: Rc::new(RefCell::new(self.to_vec())),
        }
    }

    /// True when both handles refer to the same item storage
    pub fn shares_items(&self, other: &ListProxy) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }

    /// Converts every item through the validator's basic conversion
    pub fn to_basic(&self) -> Result<Value, ConfigError> {
        let owner = self.owner()?;
        self.items
            .borrow()
            .iter()
            .map(|item| self.validator.to_basic(&owner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

impl fmt::Debug for ListProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.items.try_borrow() {
            Ok(items) => f.debug_list().entries(items.iter()).finish(),
            Err(_) => write!(f, "[<borrowed>]"),
        }
    }
}

impl PartialEq for ListProxy {
    fn eq(&self, other: &ListProxy) -> bool {
        *self.items.borrow() == *other.items.borrow()
    }
}

impl<T> PartialEq<Vec<T>> for ListProxy
where
    FieldValue: PartialEq<T>,
{
    fn eq(&self, other: &Vec<T>) -> bool {
        let items = self.items.borrow();
        items.len() == other.len() && items.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl IntoIterator for &ListProxy {
    type Item = FieldValue;
    type IntoIter = std::vec::IntoIter<FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// List of values validated against an item field or schema
///
/// Without an item validator the list accepts anything and only copies the input.
#[derive(Debug, Clone)]
pub struct ListField {
    base: FieldBase,
    item: ItemValidator,
}

impl ListField {
    pub fn new<F: Field + 'static>(item: F) -> Self {
        Self::with_validator(ItemValidator::field(item), FieldOptions::default())
    }

    /// List of configs of `schema`
    pub fn of_schema(schema: &Schema) -> Self {
        Self::with_validator(ItemValidator::schema(schema), FieldOptions::default())
    }

    /// List accepting any values
    pub fn any() -> Self {
        Self::with_validator(ItemValidator::Any, FieldOptions::default())
    }

    pub fn with_validator(item: ItemValidator, options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
            item,
        }
    }

    pub fn item_validator(&self) -> &ItemValidator {
        &self.item
    }
}

impl_field_options!(ListField);

impl Field for ListField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        format!("list[{}]", self.item.kind())
    }

    fn validate_value(&self, cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        // Always copy: the result never shares storage with the input.
        let items = match value {
            FieldValue::List(list) => list.to_vec(),
            FieldValue::Basic(Value::List(items)) => items.into_iter().map(FieldValue::Basic).collect(),
            _ => return Err(ConfigError::validation(self.name(), "is not a list object")),
        };

        let list = ListProxy::new(cfg, self.item.clone(), items)?;
        if self.is_required() && list.is_empty() {
            return Err(ConfigError::validation(self.name(), "is required"));
        }
        Ok(FieldValue::List(list))
    }

    fn set_default(&self, cfg: &Config) -> Result<(), ConfigError> {
        let key = self.base.storage_key()?;
        let value = match self.default_value() {
            Some(value) if !value.is_null() => self.from_basic(cfg, value)?,
            _ => FieldValue::List(ListProxy::empty(cfg, self.item.clone())),
        };
        cfg.store(key, value);
        Ok(())
    }

    fn to_basic(&self, cfg: &Config, value: &FieldValue) -> Result<Value, ConfigError> {
        match value {
            FieldValue::List(list) => list.to_basic(),
            FieldValue::Basic(Value::List(items)) => items
                .iter()
                .map(|item| self.item.to_basic(cfg, &FieldValue::Basic(item.clone())))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            FieldValue::Basic(Value::Null) => Ok(Value::Null),
            other => Err(ConfigError::TypeMismatch {
                key: self.name().to_string(),
                expected: "list".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    fn parse_str(&self, raw: &str) -> Value {
        Value::List(
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(Value::from)
                .collect(),
        )
    }
}
