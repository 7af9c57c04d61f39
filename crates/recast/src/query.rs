//! Outbound query surface: compiled projections applied lazily over rows.

use crate::projection::{Projection, ProjectionCompiler, ProjectionConfiguration};
use recast_core::{
    error::{Error, ErrorOrigin},
    value::Value,
};
use std::iter::FusedIterator;
use tracing::debug;

/// Compile `config` (memoized on the configuration) and project every row
/// of `rows` as it is pulled. `columns` restricts the projection to a
/// subset of target members.
pub fn build_query<I>(
    config: &ProjectionConfiguration,
    compiler: &ProjectionCompiler,
    rows: I,
    columns: Option<&[&str]>,
) -> Result<ProjectedRows<I::IntoIter>, Error>
where
    I: IntoIterator<Item = Value>,
{
    if let Some(columns) = columns
        && let Some((i, repeated)) = columns
            .iter()
            .enumerate()
            .find(|&(i, c)| columns[..i].contains(c))
    {
        return Err(Error::invalid_operation(
            ErrorOrigin::Query,
            format!("column '{repeated}' is listed more than once (position {i})"),
        ));
    }

    let projection = config.compiled(compiler)?.project(columns)?;

    debug!(
        source_type = %config.source(),
        target_type = %projection.target(),
        reduced = columns.is_some(),
        "projection query built"
    );

    Ok(ProjectedRows {
        rows: rows.into_iter(),
        projection,
    })
}

///
/// ProjectedRows
///

#[derive(Clone, Debug)]
pub struct ProjectedRows<I> {
    rows: I,
    projection: Projection,
}

impl<I> ProjectedRows<I> {
    #[must_use]
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }
}

impl<I: Iterator<Item = Value>> Iterator for ProjectedRows<I> {
    type Item = Result<Value, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| self.projection.apply(&row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<I: ExactSizeIterator<Item = Value>> ExactSizeIterator for ProjectedRows<I> {}

impl<I: FusedIterator<Item = Value>> FusedIterator for ProjectedRows<I> {}

///
/// ProjectExt
///

pub trait ProjectExt: Iterator<Item = Value> + Sized {
    fn project_with(
        self,
        config: &ProjectionConfiguration,
        compiler: &ProjectionCompiler,
        columns: Option<&[&str]>,
    ) -> Result<ProjectedRows<Self>, Error> {
        build_query(config, compiler, self, columns)
    }
}

impl<I: Iterator<Item = Value>> ProjectExt for I {}
