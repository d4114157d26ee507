//! Maps each map-style intent onto the processor or aggregator that carries it
//! out, and onto the primitive that serves it.

use crate::descriptor::{Aggregation, BatchInvocation, Invocation};
use common::error::Result;
use std::collections::HashMap;
use storage::processors::{
    CheckPresent, Compute, ComputeIfAbsent, ComputeIfPresent, Get, GetOrDefault, Merge, Nop, Put,
    PutAll, PutIfAbsent, Remove, RemoveBlind, RemoveValue, Replace, ReplaceValue, ReplaceWith,
};
use storage::{CacheKey, Count, Expiry, Filter, Scope};

pub fn get<K: CacheKey>(key: K) -> Invocation<K, Get> {
    Invocation::new(key, Get)
}

pub fn get_all<K: CacheKey, V: 'static>(
    keys: impl IntoIterator<Item = K>,
) -> BatchInvocation<K, V, Get> {
    BatchInvocation::new(Scope::keys(keys), Get)
}

/// Fails when `expiry` can never be honoured; nothing is sent to the cache in
/// that case.
pub fn put<K: CacheKey, V>(key: K, value: V, expiry: Expiry) -> Result<Invocation<K, Put<V>>> {
    let expiry = expiry.validate()?;
    Ok(Invocation::new(key, Put::new(value, expiry)))
}

pub fn put_all<K: CacheKey, V: 'static>(entries: HashMap<K, V>) -> BatchInvocation<K, V, PutAll<K, V>> {
    let keys: Vec<K> = entries.keys().cloned().collect();
    BatchInvocation::new(Scope::keys(keys), PutAll::new(entries))
}

pub fn remove<K: CacheKey>(key: K) -> Invocation<K, Remove> {
    Invocation::new(key, Remove)
}

pub fn remove_value<K: CacheKey, V>(key: K, value: V) -> Invocation<K, RemoveValue<V>> {
    Invocation::new(key, RemoveValue::new(value))
}

pub fn remove_all<K: CacheKey, V: 'static>(scope: Scope<K, V>) -> BatchInvocation<K, V, RemoveBlind> {
    BatchInvocation::new(scope, RemoveBlind)
}

pub fn key_set<K: CacheKey, V: 'static>(filter: Option<Filter<K, V>>) -> BatchInvocation<K, V, Nop> {
    BatchInvocation::new(Scope::filter(filter.unwrap_or_else(Filter::always)), Nop)
}

pub fn entry_set<K: CacheKey, V: 'static>(filter: Option<Filter<K, V>>) -> BatchInvocation<K, V, Get> {
    BatchInvocation::new(Scope::filter(filter.unwrap_or_else(Filter::always)), Get)
}

pub fn size<K: CacheKey, V: 'static>() -> Aggregation<K, V, Count> {
    Aggregation::new(Scope::all(), Count)
}

pub fn contains_key<K: CacheKey>(key: K) -> Invocation<K, CheckPresent> {
    Invocation::new(key, CheckPresent)
}

pub fn get_or_default<K: CacheKey>(key: K) -> Invocation<K, GetOrDefault> {
    Invocation::new(key, GetOrDefault)
}

pub fn put_if_absent<K: CacheKey, V>(key: K, value: V) -> Invocation<K, PutIfAbsent<V>> {
    Invocation::new(key, PutIfAbsent::new(value))
}

pub fn replace<K: CacheKey, V>(key: K, value: V) -> Invocation<K, Replace<V>> {
    Invocation::new(key, Replace::new(value))
}

pub fn replace_value<K: CacheKey, V>(key: K, expected: V, value: V) -> Invocation<K, ReplaceValue<V>> {
    Invocation::new(key, ReplaceValue::new(expected, value))
}

pub fn compute_if_absent<K: CacheKey, F>(key: K, function: F) -> Invocation<K, ComputeIfAbsent<F>> {
    Invocation::new(key, ComputeIfAbsent::new(function))
}

pub fn compute_if_present<K: CacheKey, F>(key: K, function: F) -> Invocation<K, ComputeIfPresent<F>> {
    Invocation::new(key, ComputeIfPresent::new(function))
}

pub fn compute<K: CacheKey, F>(key: K, function: F) -> Invocation<K, Compute<F>> {
    Invocation::new(key, Compute::new(function))
}

pub fn merge<K: CacheKey, V, F>(key: K, value: V, function: F) -> Invocation<K, Merge<V, F>> {
    Invocation::new(key, Merge::new(value, function))
}

pub fn replace_all<K: CacheKey, V: 'static, F>(
    scope: Scope<K, V>,
    function: F,
) -> BatchInvocation<K, V, ReplaceWith<F>> {
    BatchInvocation::new(scope, ReplaceWith::new(function))
}
