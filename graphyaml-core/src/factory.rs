//! Object factories: how a resolved type becomes an instance.

use std::fmt;
use std::sync::Arc;

use crate::{Error, Object, TypeDescriptor};

/// Creates instances of described types.
pub trait ObjectFactory: Send + Sync {
    /// A new instance, or `None` when this factory does not handle the type.
    fn create(&self, descriptor: &TypeDescriptor) -> Option<Object>;
}

/// Uses the descriptor's own default factory.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultObjectFactory;

impl ObjectFactory for DefaultObjectFactory {
    fn create(&self, descriptor: &TypeDescriptor) -> Option<Object> {
        descriptor.factory().map(|factory| factory())
    }
}

type CreateFn = Box<dyn Fn(&TypeDescriptor) -> Option<Object> + Send + Sync>;

/// Tries a closure first and falls back to another factory when the closure
/// declines.
pub struct LambdaObjectFactory {
    create: CreateFn,
    fallback: Arc<dyn ObjectFactory>,
}

impl LambdaObjectFactory {
    /// Falls back to [`DefaultObjectFactory`].
    pub fn new(create: impl Fn(&TypeDescriptor) -> Option<Object> + Send + Sync + 'static) -> Self {
        Self::with_fallback(create, Arc::new(DefaultObjectFactory))
    }

    pub fn with_fallback(
        create: impl Fn(&TypeDescriptor) -> Option<Object> + Send + Sync + 'static,
        fallback: Arc<dyn ObjectFactory>,
    ) -> Self {
        Self {
            create: Box::new(create),
            fallback,
        }
    }
}

impl fmt::Debug for LambdaObjectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaObjectFactory").finish_non_exhaustive()
    }
}

impl ObjectFactory for LambdaObjectFactory {
    fn create(&self, descriptor: &TypeDescriptor) -> Option<Object> {
        (self.create)(descriptor).or_else(|| self.fallback.create(descriptor))
    }
}

/// Runs `factory`, turning a refusal into [`Error::TypeShapeUnavailable`].
pub fn create_instance(factory: &dyn ObjectFactory, descriptor: &TypeDescriptor) -> Result<Object, Error> {
    factory
        .create(descriptor)
        .ok_or_else(|| Error::TypeShapeUnavailable {
            type_name: descriptor.type_name().to_owned(),
        })
}
