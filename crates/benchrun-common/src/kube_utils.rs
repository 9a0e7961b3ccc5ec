//! Kubernetes helpers shared by benchrun controllers

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;

use crate::Error;

/// True if the API server answered 404
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

/// True if the API server answered 409 with reason `AlreadyExists`
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists")
}

/// True if the API server rejected a write because of a stale resourceVersion
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409 && ae.reason == "Conflict")
}

/// Build the controller owner reference pointing at `owner`.
///
/// Children carrying this reference are garbage collected by the API server
/// when the owner is deleted.
pub fn controller_owner_ref<K>(owner: &K) -> Result<OwnerReference, Error>
where
    K: Resource<DynamicType = ()>,
{
    owner.controller_owner_ref(&()).ok_or_else(|| {
        Error::internal_with_context(
            "owner-reference",
            format!(
                "{} {} has no uid",
                K::kind(&()),
                owner.meta().name.as_deref().unwrap_or_default()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Perfbench, PerfbenchSpec};

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "test".to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn classifies_api_errors() {
        assert!(is_not_found(&api_error(404, "NotFound")));
        assert!(!is_not_found(&api_error(500, "InternalError")));

        assert!(is_already_exists(&api_error(409, "AlreadyExists")));
        assert!(!is_already_exists(&api_error(409, "Conflict")));

        assert!(is_conflict(&api_error(409, "Conflict")));
        assert!(!is_conflict(&api_error(409, "AlreadyExists")));
    }

    #[test]
    fn owner_ref_points_at_run() {
        let mut run = Perfbench::new("bench-1", PerfbenchSpec::default());
        run.metadata.uid = Some("uid-123".to_string());

        let owner = controller_owner_ref(&run).unwrap();
        assert_eq!(owner.kind, "Perfbench");
        assert_eq!(owner.name, "bench-1");
        assert_eq!(owner.uid, "uid-123");
        assert_eq!(owner.api_version, crate::API_VERSION);
        assert_eq!(owner.controller, Some(true));
    }

    #[test]
    fn owner_ref_requires_uid() {
        let run = Perfbench::new("bench-1", PerfbenchSpec::default());
        assert!(controller_owner_ref(&run).is_err());
    }
}
