use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use tracing::{Instrument, info_span};

use super::example::ExampleRenderer;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RewriteOutcome {
    pub(crate) examples: usize,
    pub(crate) failed_examples: usize,
}

/// Replace every example code block under `root` with its rendered fragment.
///
/// Blocks are rendered one after another in document order; each node keeps
/// its position among its siblings and only its value changes.
pub(crate) async fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    renderer: &ExampleRenderer,
    language: &str,
    document: &str,
) -> RewriteOutcome {
    let example_nodes: Vec<&'a AstNode<'a>> = root
        .descendants()
        .filter(|node| is_example_block(node, language))
        .collect();

    let mut outcome = RewriteOutcome::default();
    for (index, node) in example_nodes.into_iter().enumerate() {
        let Some(payload) = extract_code_literal(node) else {
            continue;
        };

        let rendered = renderer
            .render(&payload)
            .instrument(info_span!("example_block", document, index))
            .await;

        outcome.examples += 1;
        if !rendered.succeeded {
            outcome.failed_examples += 1;
        }

        let mut literal = rendered.fragment;
        literal.push('\n');
        let mut data = node.data.borrow_mut();
        data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 0,
            literal,
        });
    }

    outcome
}

fn is_example_block(node: &AstNode<'_>, language: &str) -> bool {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::CodeBlock(block) => block
            .info
            .split_whitespace()
            .next()
            .is_some_and(|lang| lang == language),
        _ => false,
    }
}

fn extract_code_literal(node: &AstNode<'_>) -> Option<String> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        Some(block.literal.clone())
    } else {
        None
    }
}
