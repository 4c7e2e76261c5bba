use serde::{Deserialize, Serialize};
use sift_base::{Error, Result, ScalarRange};

mod attributes;

pub use attributes::{Attributes, ScalarArray};

pub type Point3 = cgmath::Point3<f64>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    PolyData,
    UnstructuredGrid,
    StructuredGrid,
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PolyData => "poly_data",
            Self::UnstructuredGrid => "unstructured_grid",
            Self::StructuredGrid => "structured_grid",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Vertex,
    Line,
    Triangle,
    Quad,
    Polygon,
    Tetra,
    Hexahedron,
}

impl CellKind {
    /// Fixed point count, or `None` for polygons.
    pub const fn point_count(self) -> Option<usize> {
        match self {
            Self::Vertex => Some(1),
            Self::Line => Some(2),
            Self::Triangle => Some(3),
            Self::Quad | Self::Tetra => Some(4),
            Self::Hexahedron => Some(8),
            Self::Polygon => None,
        }
    }

    /// Legacy VTK cell type id.
    pub const fn vtk_type(self) -> u8 {
        match self {
            Self::Vertex => 1,
            Self::Line => 3,
            Self::Triangle => 5,
            Self::Polygon => 7,
            Self::Quad => 9,
            Self::Tetra => 10,
            Self::Hexahedron => 12,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub point_ids: Vec<usize>,
}

impl Cell {
    pub fn new(kind: CellKind, point_ids: impl Into<Vec<usize>>) -> Self {
        Self {
            kind,
            point_ids: point_ids.into(),
        }
    }

    pub fn vertex(id: usize) -> Self {
        Self::new(CellKind::Vertex, vec![id])
    }
}

/// Mesh with scalar fields attached to its points and cells.
///
/// Every constructor validates, deserialization included: each cell
/// references existing points and each attribute array matches its entity
/// count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    kind: DatasetKind,
    points: Vec<Point3>,
    cells: Vec<Cell>,
    point_data: Attributes,
    cell_data: Attributes,
}

#[derive(Deserialize)]
struct RawDataset {
    kind: DatasetKind,
    points: Vec<Point3>,
    cells: Vec<Cell>,
    #[serde(default)]
    point_data: Attributes,
    #[serde(default)]
    cell_data: Attributes,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = Error;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Self::from_parts(
            raw.kind,
            raw.points,
            raw.cells,
            raw.point_data,
            raw.cell_data,
        )
    }
}

impl Dataset {
    pub fn empty(kind: DatasetKind) -> Self {
        Self {
            kind,
            points: Vec::new(),
            cells: Vec::new(),
            point_data: Attributes::new(),
            cell_data: Attributes::new(),
        }
    }

    pub(crate) fn from_parts(
        kind: DatasetKind,
        points: Vec<Point3>,
        cells: Vec<Cell>,
        point_data: Attributes,
        cell_data: Attributes,
    ) -> Result<Self> {
        let dataset = Self {
            kind,
            points,
            cells,
            point_data,
            cell_data,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn point_data(&self) -> &Attributes {
        &self.point_data
    }

    pub fn cell_data(&self) -> &Attributes {
        &self.cell_data
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.cells.is_empty()
    }

    pub fn point_scalar_range(&self) -> Option<ScalarRange> {
        self.point_data.scalars().and_then(ScalarArray::range)
    }

    pub fn cell_scalar_range(&self) -> Option<ScalarRange> {
        self.cell_data.scalars().and_then(ScalarArray::range)
    }

    pub fn validate(&self) -> Result<()> {
        for (index, cell) in self.cells.iter().enumerate() {
            match cell.kind.point_count() {
                Some(count) if cell.point_ids.len() != count => {
                    return Err(Error::InvalidDataset(format!(
                        "cell {index} ({:?}) has {} points, expected {count}",
                        cell.kind,
                        cell.point_ids.len()
                    )));
                }
                None if cell.point_ids.len() < 3 => {
                    return Err(Error::InvalidDataset(format!(
                        "polygon cell {index} has fewer than 3 points"
                    )));
                }
                _ => {}
            }
            if let Some(&id) = cell.point_ids.iter().find(|&&id| id >= self.points.len()) {
                return Err(Error::InvalidDataset(format!(
                    "cell {index} references point {id}, dataset has {}",
                    self.points.len()
                )));
            }
        }
        self.point_data.validate(self.points.len(), "point")?;
        self.cell_data.validate(self.cells.len(), "cell")?;
        Ok(())
    }

    /// Unstructured grid holding only `cell_ids`, in that order, and the points
    /// they use renumbered by first use. Ids must be in bounds.
    pub fn extract_cells(&self, cell_ids: &[usize]) -> Self {
        let mut remap: Vec<Option<usize>> = vec![None; self.points.len()];
        let mut used_points = Vec::new();
        let mut cells = Vec::with_capacity(cell_ids.len());

        for &cell_id in cell_ids {
            let cell = &self.cells[cell_id];
            let mut point_ids = Vec::with_capacity(cell.point_ids.len());
            for &old in &cell.point_ids {
                let new = *remap[old].get_or_insert_with(|| {
                    used_points.push(old);
                    used_points.len() - 1
                });
                point_ids.push(new);
            }
            cells.push(Cell::new(cell.kind, point_ids));
        }

        Self {
            kind: DatasetKind::UnstructuredGrid,
            points: used_points.iter().map(|&id| self.points[id]).collect(),
            cells,
            point_data: self.point_data.select(&used_points),
            cell_data: self.cell_data.select(cell_ids),
        }
    }

    /// Poly data holding only `point_ids` with one vertex cell each. Cell
    /// attributes are dropped. Ids must be in bounds.
    pub fn extract_points(&self, point_ids: &[usize]) -> Self {
        Self {
            kind: DatasetKind::PolyData,
            points: point_ids.iter().map(|&id| self.points[id]).collect(),
            cells: (0..point_ids.len()).map(Cell::vertex).collect(),
            point_data: self.point_data.select(point_ids),
            cell_data: Attributes::new(),
        }
    }

    /// Copy of this dataset with new values for the active point scalars.
    pub fn with_point_scalar_values(&self, values: Vec<f64>) -> Result<Self> {
        let mut dataset = self.clone();
        dataset.point_data.replace_scalar_values(values)?;
        Ok(dataset)
    }

    /// Copy of this dataset with new values for the active cell scalars.
    pub fn with_cell_scalar_values(&self, values: Vec<f64>) -> Result<Self> {
        let mut dataset = self.clone();
        dataset.cell_data.replace_scalar_values(values)?;
        Ok(dataset)
    }
}

pub struct DatasetBuilder {
    kind: DatasetKind,
    points: Vec<Point3>,
    cells: Vec<Cell>,
    point_data: Attributes,
    cell_data: Attributes,
}

impl DatasetBuilder {
    pub fn new(kind: DatasetKind) -> Self {
        Self {
            kind,
            points: Vec::new(),
            cells: Vec::new(),
            point_data: Attributes::new(),
            cell_data: Attributes::new(),
        }
    }

    /// `nx` by `ny` points on the z = 0 plane, joined by quads.
    pub fn structured_grid(nx: usize, ny: usize, spacing: f64) -> Result<Self> {
        ensure_at_least("nx", nx, 2)?;
        ensure_at_least("ny", ny, 2)?;
        ensure_positive("spacing", spacing)?;

        let points = (0..ny)
            .flat_map(|j| (0..nx).map(move |i| (i, j)))
            .map(|(i, j)| Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));

        let cells = (0..ny - 1).flat_map(|j| {
            (0..nx - 1).map(move |i| {
                let p0 = j * nx + i;
                Cell::new(CellKind::Quad, vec![p0, p0 + 1, p0 + 1 + nx, p0 + nx])
            })
        });

        Ok(Self::new(DatasetKind::StructuredGrid)
            .points(points)
            .cells(cells))
    }

    /// Points with one vertex cell each.
    pub fn point_cloud(points: impl IntoIterator<Item = Point3>) -> Self {
        let points: Vec<Point3> = points.into_iter().collect();
        let cells = (0..points.len()).map(Cell::vertex);
        Self::new(DatasetKind::PolyData).points(points).cells(cells)
    }

    pub fn points(mut self, points: impl IntoIterator<Item = Point3>) -> Self {
        self.points.extend(points);
        self
    }

    pub fn cell(mut self, cell: Cell) -> Self {
        self.cells.push(cell);
        self
    }

    pub fn cells(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.cells.extend(cells);
        self
    }

    /// Adds point scalars and makes them active.
    pub fn point_scalars(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.point_data.add_scalars(ScalarArray::new(name, values));
        self
    }

    /// Evaluates `field` at every point added so far and makes it the active
    /// point scalars.
    pub fn point_scalars_from(
        self,
        name: impl Into<String>,
        field: impl Fn(&Point3) -> f64,
    ) -> Self {
        let values = self.points.iter().map(field).collect();
        self.point_scalars(name, values)
    }

    pub fn point_array(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.point_data.add_array(ScalarArray::new(name, values));
        self
    }

    /// Adds cell scalars and makes them active.
    pub fn cell_scalars(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.cell_data.add_scalars(ScalarArray::new(name, values));
        self
    }

    pub fn cell_array(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.cell_data.add_array(ScalarArray::new(name, values));
        self
    }

    pub fn build(self) -> Result<Dataset> {
        Dataset::from_parts(
            self.kind,
            self.points,
            self.cells,
            self.point_data,
            self.cell_data,
        )
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value <= 0.0 || !value.is_finite() {
        return Err(Error::InvalidParameter(format!("{name} must be > 0")));
    }
    Ok(())
}

fn ensure_at_least(name: &str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(Error::InvalidParameter(format!("{name} must be >= {min}")));
    }
    Ok(())
}
