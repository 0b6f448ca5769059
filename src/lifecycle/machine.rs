use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::errors::{LifecycleError, Result};

/// entity whose status is driven by a [`StateMachine`]
pub trait Stateful: Clone {
    type State: Copy + Eq + Hash + Debug;

    fn state(&self) -> Self::State;

    fn set_state(&mut self, state: Self::State);
}

/// guard over the entity and the caller-supplied context; `Err` carries the reason
pub type Guard<E, C> = Box<dyn Fn(&E, &C) -> std::result::Result<(), String> + Send + Sync>;

/// generic guarded-transition engine
pub struct StateMachine<E: Stateful, C> {
    entity: &'static str,
    edges: HashMap<(E::State, E::State), Option<Guard<E, C>>>,
}

impl<E: Stateful, C> StateMachine<E, C> {
    pub fn builder(entity: &'static str) -> StateMachineBuilder<E, C> {
        StateMachineBuilder {
            entity,
            edges: HashMap::new(),
        }
    }

    /// entity name used in errors and logs
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// true if the edge is declared, ignoring guards
    pub fn has_edge(&self, from: E::State, to: E::State) -> bool {
        self.edges.contains_key(&(from, to))
    }

    /// a state without outgoing edges
    pub fn is_terminal(&self, state: E::State) -> bool {
        !self.edges.keys().any(|(from, _)| *from == state)
    }

    /// declared targets reachable from a state
    pub fn targets(&self, from: E::State) -> Vec<E::State> {
        self.edges
            .keys()
            .filter(|(f, _)| *f == from)
            .map(|(_, to)| *to)
            .collect()
    }

    /// check an edge and its guard without producing the new entity
    pub fn check(&self, entity: &E, target: E::State, context: &C) -> Result<()> {
        let from = entity.state();
        let guard = self.edges.get(&(from, target)).ok_or_else(|| {
            LifecycleError::InvalidTransition {
                entity: self.entity,
                from: format!("{from:?}"),
                to: format!("{target:?}"),
            }
        })?;

        if let Some(guard) = guard {
            guard(entity, context).map_err(|reason| LifecycleError::GuardRejected {
                entity: self.entity,
                from: format!("{from:?}"),
                to: format!("{target:?}"),
                reason,
            })?;
        }

        Ok(())
    }

    /// validate and return the updated entity; callers persist it
    pub fn transition(&self, entity: &E, target: E::State, context: &C) -> Result<E> {
        self.check(entity, target, context)?;
        let mut next = entity.clone();
        next.set_state(target);
        Ok(next)
    }
}

impl<E: Stateful, C> Debug for StateMachine<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut edges: Vec<String> = self
            .edges
            .iter()
            .map(|((from, to), guard)| {
                format!("{from:?} -> {to:?}{}", if guard.is_some() { " [guarded]" } else { "" })
            })
            .collect();
        edges.sort();
        f.debug_struct("StateMachine")
            .field("entity", &self.entity)
            .field("edges", &edges)
            .finish()
    }
}

/// builder for [`StateMachine`] edge tables
pub struct StateMachineBuilder<E: Stateful, C> {
    entity: &'static str,
    edges: HashMap<(E::State, E::State), Option<Guard<E, C>>>,
}

impl<E: Stateful, C> StateMachineBuilder<E, C> {
    /// unguarded edge
    pub fn edge(mut self, from: E::State, to: E::State) -> Self {
        self.edges.insert((from, to), None);
        self
    }

    /// edge with a guard predicate
    pub fn guarded<F>(mut self, from: E::State, to: E::State, guard: F) -> Self
    where
        F: Fn(&E, &C) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.edges.insert((from, to), Some(Box::new(guard)));
        self
    }

    /// the same unguarded edge from every listed source
    pub fn edges_from(mut self, sources: &[E::State], to: E::State) -> Self {
        for from in sources {
            self.edges.insert((*from, to), None);
        }
        self
    }

    pub fn build(self) -> StateMachine<E, C> {
        StateMachine {
            entity: self.entity,
            edges: self.edges,
        }
    }
}
