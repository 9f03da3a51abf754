use std::time::Instant;

use crate::errors::{ArboristError, ExError, ExErrorKind};
use crate::model::{Attributes, Entity, EntityReference};
use crate::store_client::DocumentStore;
use crate::{log_op_end, log_op_start};

/// A descendant seen during discovery, with the attributes it was listed with
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredNode {
    pub reference: EntityReference,
    pub attributes: Attributes,
}

/// A subtree that could not be fully listed
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryFailure {
    /// Entity whose children could not be enumerated
    pub path: EntityReference,
    pub error: ExError,
}

/// Result of walking one subtree
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub root: EntityReference,
    /// Root and every descendant, children before parents; the root is last
    pub order: Vec<EntityReference>,
    /// Every descendant (root excluded), in `order` order
    pub descendants: Vec<DiscoveredNode>,
    pub failures: Vec<DiscoveryFailure>,
}

impl Discovery {
    /// True when every listing under the root succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn descendant_count(&self) -> usize {
        self.descendants.len()
    }
}

enum Frame {
    Enter {
        reference: EntityReference,
        attributes: Option<Attributes>,
        depth: usize,
    },
    Exit {
        reference: EntityReference,
        attributes: Option<Attributes>,
    },
}

/// Discover the subtree under `root`
///
/// Returns the root and all of its descendants in depth-first,
/// children-before-parent order. The walk uses an explicit stack; `max_depth`
/// bounds how many levels below the root are followed. A level beyond the
/// guard is recorded as `DepthExceeded` instead of being listed.
///
/// A listing that fails with `NotFound` is treated as empty. Any other
/// listing error aborts only the affected subtree and is recorded as a
/// `DiscoveryFailed` failure; siblings are still walked.
///
/// Discovery only reads from the store.
pub async fn discover<S>(store: &S, root: &EntityReference, max_depth: usize) -> Discovery
where
    S: DocumentStore + ?Sized,
{
    let start = Instant::now();
    log_op_start!("discover", entity_path = %root, max_depth = max_depth);

    let mut discovery = Discovery {
        root: root.clone(),
        order: Vec::new(),
        descendants: Vec::new(),
        failures: Vec::new(),
    };

    let mut stack = vec![Frame::Enter {
        reference: root.clone(),
        attributes: None,
        depth: 0,
    }];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Exit {
                reference,
                attributes,
            } => {
                if let Some(attributes) = attributes {
                    discovery.descendants.push(DiscoveredNode {
                        reference: reference.clone(),
                        attributes,
                    });
                }
                discovery.order.push(reference);
            }
            Frame::Enter {
                reference,
                attributes,
                depth,
            } => {
                let children = match list_children(store, &reference).await {
                    Ok(children) => children,
                    Err(failure) => {
                        discovery.failures.push(failure);
                        Vec::new()
                    }
                };

                stack.push(Frame::Exit {
                    reference: reference.clone(),
                    attributes,
                });

                if children.is_empty() {
                    continue;
                }
                if depth >= max_depth {
                    let err = ArboristError::DepthExceeded {
                        path: reference.to_string(),
                        max_depth,
                    };
                    tracing::warn!(entity_path = %reference, max_depth, "depth guard reached");
                    discovery.failures.push(DiscoveryFailure {
                        path: reference,
                        error: err.into(),
                    });
                    continue;
                }

                // Reverse so children are visited in listing order
                for (child, attrs) in children.into_iter().rev() {
                    stack.push(Frame::Enter {
                        reference: child,
                        attributes: Some(attrs),
                        depth: depth + 1,
                    });
                }
            }
        }
    }

    log_op_end!(
        "discover",
        duration_ms = start.elapsed().as_millis() as u64,
        entity_path = %root,
        descendant_count = discovery.descendant_count(),
        failures = discovery.failures.len()
    );
    discovery
}

/// List every direct child document of `parent` across all child collections
///
/// A failure in one child collection is returned after the other collections
/// are listed, so a partial listing is never mistaken for a complete one.
async fn list_children<S>(
    store: &S,
    parent: &EntityReference,
) -> std::result::Result<Vec<(EntityReference, Attributes)>, DiscoveryFailure>
where
    S: DocumentStore + ?Sized,
{
    let collections = match store.list_child_collections(parent).await {
        Ok(collections) => collections,
        Err(err) if err.kind() == ExErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(discovery_failure(parent, None, err)),
    };

    let mut children = Vec::new();
    let mut first_failure = None;
    for collection in collections {
        match store.list_documents(parent, &collection).await {
            Ok(entities) => {
                children.extend(entities.into_iter().map(|Entity { id, attributes }| {
                    (parent.child(collection.as_str(), id), attributes)
                }));
            }
            Err(err) if err.kind() == ExErrorKind::NotFound => {}
            Err(err) => {
                if first_failure.is_none() {
                    first_failure = Some(discovery_failure(parent, Some(&collection), err));
                }
            }
        }
    }

    match first_failure {
        Some(failure) => Err(failure),
        None => Ok(children),
    }
}

fn discovery_failure(
    parent: &EntityReference,
    collection: Option<&str>,
    source: ExError,
) -> DiscoveryFailure {
    tracing::warn!(entity_path = %parent, error = %source, "subtree listing failed");
    let mut error: ExError = ArboristError::DiscoveryFailed {
        path: parent.to_string(),
        reason: source.message().to_string(),
    }
    .into();
    if let Some(collection) = collection {
        error = error.with_collection(collection);
    }
    DiscoveryFailure {
        path: parent.clone(),
        error: error.with_source(source),
    }
}
