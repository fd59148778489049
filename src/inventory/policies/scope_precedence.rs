use crate::inventory::domain::DependencyScope;

/// ScopePrecedence policy for resolving duplicate-component collisions
///
/// When the same `(name, version, group)` identity is reported through
/// more than one scan path, the merged component keeps the strongest
/// scope. A dependency declared directly in one manifest and pulled in
/// transitively via another is recorded once, as direct.
///
/// Precedence order:
/// 1. direct
/// 2. transitive
/// 3. dev
pub struct ScopePrecedence;

impl ScopePrecedence {
    /// Returns the stronger of two scopes under the precedence order.
    pub fn stronger(a: DependencyScope, b: DependencyScope) -> DependencyScope {
        if Self::rank(a) <= Self::rank(b) {
            a
        } else {
            b
        }
    }

    fn rank(scope: DependencyScope) -> u8 {
        match scope {
            DependencyScope::Direct => 0,
            DependencyScope::Transitive => 1,
            DependencyScope::Dev => 2,
        }
    }
}
