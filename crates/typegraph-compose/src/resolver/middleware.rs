use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{ResolveFn, ResolveParams, ResolveResult, Resolver, ResolverOverrides};
use crate::Result;

/// Resolve middleware: receives the next resolve function and the params.
pub type Middleware =
    Arc<dyn Fn(ResolveFn, ResolveParams) -> BoxFuture<'static, ResolveResult> + Send + Sync>;

/// Wraps an async closure into a [`Middleware`].
pub fn middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(ResolveFn, ResolveParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolveResult> + Send + 'static,
{
    Arc::new(move |next, rp| Box::pin(f(next, rp)))
}

impl Resolver {
    /// Derives a resolver whose resolve function runs through `middlewares`.
    ///
    /// The first middleware is the outermost: it runs first and sees the
    /// result of everything after it.
    pub fn with_middlewares(&self, middlewares: Vec<Middleware>) -> Result<Resolver> {
        self.wrap_with(ResolverOverrides::named("withMiddlewares"), |clone, _| {
            let resolve = middlewares
                .into_iter()
                .rev()
                .fold(clone.get_resolve(), |next, mw| -> ResolveFn {
                    Arc::new(move |rp| mw(next.clone(), rp))
                });
            clone.set_resolve(resolve);
            Ok(clone)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_graphql::Value;

    use super::*;
    use crate::SchemaComposer;
    use crate::resolver::{ResolverDefinition, resolve_fn};

    fn tracing_middleware(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Middleware {
        middleware(move |next, rp| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("{label}:before"));
                let result = next(rp).await;
                log.lock().unwrap().push(format!("{label}:after"));
                result
            }
        })
    }

    #[tokio::test]
    async fn test_first_middleware_is_outermost() {
        let sc = SchemaComposer::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner_log = log.clone();
        let resolver = sc
            .create_resolver(ResolverDefinition::new("ping").type_("String").resolve(
                resolve_fn(move |_| {
                    let log = inner_log.clone();
                    async move {
                        log.lock().unwrap().push("resolve".to_string());
                        Ok(Some(Value::String("pong".into())))
                    }
                }),
            ))
            .unwrap();

        let wrapped = resolver
            .with_middlewares(vec![
                tracing_middleware("m1", log.clone()),
                tracing_middleware("m2", log.clone()),
            ])
            .unwrap();

        let result = (wrapped.get_resolve())(ResolveParams::new(Value::Null))
            .await
            .unwrap();
        assert_eq!(result, Some(Value::String("pong".into())));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["m1:before", "m2:before", "resolve", "m2:after", "m1:after"]
        );
        assert_eq!(wrapped.get_nested_name(), "withMiddlewares(ping)");
    }

    #[tokio::test]
    async fn test_middleware_can_short_circuit() {
        let sc = SchemaComposer::new();
        let resolver = sc
            .create_resolver(ResolverDefinition::new("secret").type_("String").resolve(
                resolve_fn(|_| async { Ok(Some(Value::String("classified".into()))) }),
            ))
            .unwrap();

        let guarded = resolver
            .with_middlewares(vec![middleware(|next, rp: ResolveParams| async move {
                if rp.arg("token").is_none() {
                    return Err(async_graphql::Error::new("unauthorized"));
                }
                next(rp).await
            })])
            .unwrap();

        let err = (guarded.get_resolve())(ResolveParams::new(Value::Null))
            .await
            .unwrap_err();
        assert_eq!(err.message, "unauthorized");

        let ok = (guarded.get_resolve())(
            ResolveParams::new(Value::Null).with_arg("token", Value::String("t".into())),
        )
        .await
        .unwrap();
        assert_eq!(ok, Some(Value::String("classified".into())));
    }
}
