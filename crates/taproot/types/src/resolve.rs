//! Stack resolution: map an optional caller-supplied name onto exactly
//! one synthesized stack.

use crate::error::{StackError, StackResult};
use crate::stack::Stack;

/// Resolve a target stack from the synthesis result.
///
/// `stacks` is `None` until synthesis has populated it; asking earlier
/// is a sequencing fault, not a user mistake. With a name, only an
/// exact match resolves. Without one, resolution succeeds only when
/// there is exactly one stack to pick.
pub fn resolve_stack<'a>(
    stacks: Option<&'a [Stack]>,
    name: Option<&str>,
) -> StackResult<&'a Stack> {
    let stacks = stacks.ok_or(StackError::NotYetSynthesized)?;

    match name {
        Some(name) => stacks
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| StackError::UnknownStack(name.to_string())),
        None => match stacks {
            [only] => Ok(only),
            _ => Err(StackError::StackSelectionRequired),
        },
    }
}
