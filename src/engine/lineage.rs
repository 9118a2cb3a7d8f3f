//! engine::lineage
//!
//! Reference lineage: the chain of type variants from an element down
//! through each `Reference`, ending at the first non-reference type.
//!
//! Targets are fetched by type-only resolution, so lineage never needs the
//! full target documents. A chain that ends at a missing or untyped target
//! stops there, without a terminal entry; [`trace`] tells the two apart.

use tracing::debug;

use super::element::ElementEngine;
use super::guard::ResolutionPath;
use super::ResolveError;
use crate::core::element::{Element, ElementType, RefTarget, ReferenceType};
use crate::core::types::{kinds, Urn};

/// The lineage of `element`, empty when it has no type.
pub fn lineage(
    engine: &ElementEngine<'_>,
    element: &Element,
) -> Result<Vec<ElementType>, ResolveError> {
    match &element.element_type {
        Some(ty) => walk(engine, &element.id, ty.clone()),
        None => Ok(Vec::new()),
    }
}

/// Walk the reference chain starting at the type `ty` of element `start`.
///
/// Reference entries are recorded by target id only.
pub fn walk(
    engine: &ElementEngine<'_>,
    start: &Urn,
    ty: ElementType,
) -> Result<Vec<ElementType>, ResolveError> {
    trace(engine, start, ty).map(|trace| trace.chain)
}

/// A walked reference chain.
#[derive(Debug)]
pub struct Trace {
    pub chain: Vec<ElementType>,
    /// Set when the chain stopped at a target no layer holds.
    pub dangling: Option<ResolveError>,
}

/// Like [`walk`], but also reports a missing target at the end of the chain.
pub fn trace(
    engine: &ElementEngine<'_>,
    start: &Urn,
    ty: ElementType,
) -> Result<Trace, ResolveError> {
    let mut path = ResolutionPath::new(engine.max_depth());
    path.enter(start)?;

    let mut chain = Vec::new();
    let mut dangling = None;
    let mut owner = start.clone();
    let mut current = ty;
    loop {
        match current {
            ElementType::Reference(reference) => {
                let target = reference.target.id().clone();
                let embedded = reference.target.element().map(|e| e.element_type.clone());
                chain.push(ElementType::Reference(ReferenceType {
                    target: RefTarget::Urn(target.clone()),
                    extra: reference.extra,
                }));

                path.enter(&target)?;
                match engine.read_type(&target)?.or(embedded.clone().flatten()) {
                    Some(next) => {
                        current = next;
                        owner = target;
                    }
                    None => {
                        if embedded.is_none() && !engine.store().exists(&target, kinds::ELEMENT)? {
                            debug!(start = %start, target = %target, "lineage stops at missing target");
                            dangling = Some(ResolveError::DanglingReference { id: owner, target });
                        } else {
                            debug!(start = %start, target = %target, "lineage stops at untyped target");
                        }
                        break;
                    }
                }
            }
            terminal => {
                chain.push(terminal);
                break;
            }
        }
    }

    Ok(Trace { chain, dangling })
}
