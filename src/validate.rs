/// Accept a scan target unless it is empty or contains `;` or `&`.
///
/// This is only a denylist against command-injection payloads reaching a backend that
/// shells out to its scanner. It does not check that the target is an IP or hostname.
pub fn validate_target(target: &str) -> bool {
    !target.is_empty() && !target.contains([';', '&'])
}
