//! Request dispatch: resolve `Class.Method`, check arity, invoke.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ErrorObject;
use crate::registry::RegistrySnapshot;
use crate::request::Request;
use crate::response::Response;

/// Execute one request against the registry.
///
/// Never fails: every resolution or invocation failure becomes an error
/// response carrying the request's id.
pub fn execute(registry: &RegistrySnapshot, mut request: Request) -> Response {
    let params = std::mem::take(&mut request.params);
    let outcome = invoke(registry, &request, params);

    match outcome {
        Ok(result) => {
            debug!("{} -> ok", request.method);
            Response::success(request.id, result)
        }
        Err(error) => {
            debug!("{} -> {}", request.method, error);
            Response::error(request.id, error)
        }
    }
}

fn invoke(
    registry: &RegistrySnapshot,
    request: &Request,
    params: Vec<Value>,
) -> Result<Option<Value>, ErrorObject> {
    let (class, method) = request
        .call_target()
        .ok_or_else(|| ErrorObject::malformed_call(&request.method))?;

    let factory = registry
        .get(class)
        .ok_or_else(|| ErrorObject::unregistered_object(class))?;

    let mut object = factory.instantiate();
    let arity = object
        .method_arity(method)
        .ok_or_else(|| ErrorObject::unknown_method(method))?;

    if arity != params.len() {
        return Err(ErrorObject::arity_mismatch());
    }

    match catch_unwind(AssertUnwindSafe(|| object.invoke(method, params))) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(err.to_error_object()),
        Err(panic) => {
            warn!("{}.{} panicked", class, method);
            let error =
                ErrorObject::internal_error(format!("method {}.{} panicked", class, method));
            Err(match panic_message(panic.as_ref()) {
                Some(message) => error.with_data(Value::String(message)),
                None => error,
            })
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> Option<String> {
    if let Some(message) = panic.downcast_ref::<&str>() {
        Some((*message).to_string())
    } else {
        panic.downcast_ref::<String>().cloned()
    }
}
