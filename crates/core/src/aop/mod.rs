//! Aspect weaving: advice bound to `"<bean>.<method>"` pointcuts, the
//! interceptor a proxy routes calls through, and the post-processor that
//! swaps advised beans for their proxies.

pub mod advice;
pub mod interceptor;
pub mod weaver;

pub use advice::{AdviceDescriptor, AdviceIndex, AdviceKind, JoinPoint, Pointcut};
pub use interceptor::{AspectHandle, BoundAdvice, MethodInterceptor};
pub use weaver::AspectAutoProxyCreator;
