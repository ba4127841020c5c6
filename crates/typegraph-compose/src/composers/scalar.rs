use std::cell::RefCell;
use std::rc::Rc;

use async_graphql::dynamic;

use crate::Result;
use crate::extensions::{Directive, Extensions};
use crate::mapper::ScalarTypeConfig;
use crate::schema::{SchemaComposer, WeakSchema};

pub(crate) struct ScalarInner {
    sc: WeakSchema,
    name: String,
    description: Option<String>,
    specified_by_url: Option<String>,
    extensions: Extensions,
    directives: Vec<Directive>,
}

/// Composer for a custom scalar.
#[derive(Clone)]
pub struct ScalarTypeComposer {
    inner: Rc<RefCell<ScalarInner>>,
}

impl_composer_common!(ScalarTypeComposer);
impl_composer_factory!(ScalarTypeComposer, ScalarTypeConfig, Scalar);

impl ScalarTypeComposer {
    pub(crate) fn from_config(config: ScalarTypeConfig, sc: &SchemaComposer) -> Result<Self> {
        Ok(Self {
            inner: Rc::new(RefCell::new(ScalarInner {
                sc: sc.downgrade(),
                name: config.name,
                description: config.description,
                specified_by_url: config.specified_by_url,
                extensions: config.extensions,
                directives: config.directives,
            })),
        })
    }

    pub fn get_specified_by_url(&self) -> Option<String> {
        self.inner.borrow().specified_by_url.clone()
    }

    pub fn set_specified_by_url(&self, url: Option<String>) -> &Self {
        self.inner.borrow_mut().specified_by_url = url;
        self
    }

    /// Independent copy under `new_name`, not registered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for an empty name or the current name.
    pub fn clone_as(&self, new_name: &str) -> Result<Self> {
        super::check_clone_name(&self.get_type_name(), new_name)?;
        let inner = self.inner.borrow();
        Ok(Self {
            inner: Rc::new(RefCell::new(ScalarInner {
                sc: inner.sc.clone(),
                name: new_name.to_string(),
                description: inner.description.clone(),
                specified_by_url: inner.specified_by_url.clone(),
                extensions: inner.extensions.clone(),
                directives: inner.directives.clone(),
            })),
        })
    }

    pub fn get_type(&self) -> dynamic::Scalar {
        let inner = self.inner.borrow();
        let mut scalar = dynamic::Scalar::new(inner.name.as_str());
        if let Some(description) = &inner.description {
            scalar = scalar.description(description.as_str());
        }
        if let Some(url) = &inner.specified_by_url {
            scalar = scalar.specified_by_url(url.as_str());
        }
        scalar
    }
}
