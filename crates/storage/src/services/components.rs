use crate::models::{Component, Credit};

/// Components a course must be graded on, in display order.
///
/// Every course has CA1 and ESE. CA2 joins at credit 2, CA3 at credit 3, and
/// CA4 only at exactly credit 4.
pub fn required_components(credit: Credit) -> Vec<Component> {
    let credit = credit.get();
    let mut components = vec![Component::Ca1];

    if credit >= 2 {
        components.push(Component::Ca2);
    }
    if credit >= 3 {
        components.push(Component::Ca3);
    }
    if credit == 4 {
        components.push(Component::Ca4);
    }

    components.push(Component::Ese);
    components
}

pub fn is_required(credit: Credit, component: Component) -> bool {
    required_components(credit).contains(&component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Component::*;

    fn credit(value: i16) -> Credit {
        Credit::try_from(value).unwrap()
    }

    #[test]
    fn test_required_components_per_credit() {
        assert_eq!(required_components(credit(1)), vec![Ca1, Ese]);
        assert_eq!(required_components(credit(2)), vec![Ca1, Ca2, Ese]);
        assert_eq!(required_components(credit(3)), vec![Ca1, Ca2, Ca3, Ese]);
        assert_eq!(
            required_components(credit(4)),
            vec![Ca1, Ca2, Ca3, Ca4, Ese]
        );
    }

    #[test]
    fn test_ca4_only_for_four_credits() {
        assert!(!is_required(credit(3), Ca4));
        assert!(is_required(credit(4), Ca4));
        assert!(!is_required(credit(1), Ca2));
        assert!(is_required(credit(1), Ese));
    }
}
