//! Pass 18: tail-call elimination.
//!
//! A method whose tail position sends its own message to `self` loops
//! instead of recursing: the send is rewritten into a [`Expr::TailJump`],
//! which the code generator turns into a backward jump after rebinding the
//! argument registers.

use super::{Block, Expr};

pub fn run(mut block: Block) -> Block {
    rewrite_nested(&mut block.body);
    block
}

/// Finds method definitions anywhere in the tree and rewrites their tails.
fn rewrite_nested(expressions: &mut [Expr]) {
    for expression in expressions {
        match expression {
            Expr::DefineMethod { name, block } => {
                rewrite_nested(&mut block.body);
                rewrite_method(name.clone(), block);
            }
            Expr::DefineObject { body, .. }
            | Expr::DefineTrait { body, .. }
            | Expr::ImplementTrait { body, .. }
            | Expr::Sequence { expressions: body } => rewrite_nested(body),
            Expr::Block(block) => rewrite_nested(&mut block.body),
            Expr::Try {
                expression,
                else_body,
                ..
            } => {
                rewrite_nested(std::slice::from_mut(expression.as_mut()));
                rewrite_nested(else_body);
            }
            _ => {}
        }
    }
}

fn rewrite_method(name: String, block: &mut Block) {
    // Explicit returns are tail positions wherever they appear.
    for expression in &mut block.body {
        rewrite_returns(&name, expression);
    }

    // So is the final expression of the body.
    if let Some(last) = block.body.last_mut() {
        rewrite_tail(&name, last);
    }
}

fn rewrite_returns(name: &str, expression: &mut Expr) {
    match expression {
        Expr::Return { value: Some(value) } => rewrite_tail(name, value),
        Expr::Try { else_body, .. } => {
            for expression in else_body {
                rewrite_returns(name, expression);
            }
        }
        Expr::Sequence { expressions } => {
            for expression in expressions {
                rewrite_returns(name, expression);
            }
        }
        _ => {}
    }
}

/// Rewrites `self.name(args)` in tail position into a backward jump.
fn rewrite_tail(name: &str, expression: &mut Expr) {
    let is_self_recursive = matches!(
        expression,
        Expr::SendMessage {
            receiver,
            name: sent,
            ..
        } if sent == name && matches!(receiver.as_ref(), Expr::GetSelf)
    );

    if is_self_recursive {
        if let Expr::SendMessage { arguments, .. } = expression {
            *expression = Expr::TailJump {
                arguments: std::mem::take(arguments),
            };
        }

        return;
    }

    if let Expr::Return { value: Some(value) } = expression {
        rewrite_tail(name, value);
    }
}
