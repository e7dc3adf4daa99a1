use crate::core::spatial::GeoTransform;
use crate::error::{PlanError, Result};
use crate::utils::float::FloatEx;
use gdal::Dataset;
use geo::{BoundingRect, Contains, Intersects, Point, Polygon, Rect};
use std::fmt;
use std::sync::{Arc, Mutex};

pub trait PixelSource {
    fn read_at(&self, col: isize, row: isize) -> Option<f32>;
    fn width(&self) -> usize;
    fn height(&self) -> usize;
}

/// Where the cell values live: fully in memory, or behind an open band 1.
#[derive(Clone)]
enum CellStore {
    Memory(Arc<Vec<f32>>),
    Band(Arc<Mutex<Dataset>>),
}

impl fmt::Debug for CellStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellStore::Memory(data) => write!(f, "Memory({} cells)", data.len()),
            CellStore::Band(_) => write!(f, "Band"),
        }
    }
}

/// Single-band elevation raster, row-major from the top-left corner.
#[derive(Clone, Debug)]
pub struct DsmGrid {
    pub transform: GeoTransform,
    width: usize,
    height: usize,
    no_data_value: Option<f64>,
    cells: CellStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWindow {
    pub col_start: usize,
    pub col_end: usize,
    pub row_start: usize,
    pub row_end: usize,
}

impl CellWindow {
    fn cols(&self) -> usize {
        self.col_end - self.col_start
    }

    fn rows(&self) -> usize {
        self.row_end - self.row_start
    }

    fn contains(&self, col: isize, row: isize) -> bool {
        col >= self.col_start as isize
            && col < self.col_end as isize
            && row >= self.row_start as isize
            && row < self.row_end as isize
    }
}

enum WindowCells<'a> {
    Borrowed(&'a [f32]),
    Owned(Vec<f32>),
}

/// Cells of one window, addressed in raster coordinates.
pub struct WindowView<'a> {
    grid: &'a DsmGrid,
    window: CellWindow,
    cells: WindowCells<'a>,
}

impl PixelSource for WindowView<'_> {
    fn read_at(&self, col: isize, row: isize) -> Option<f32> {
        if !self.window.contains(col, row) {
            return None;
        }

        let (col, row) = (col as usize, row as usize);
        let value = match &self.cells {
            WindowCells::Borrowed(data) => data[row * self.grid.width + col],
            WindowCells::Owned(data) => {
                data[(row - self.window.row_start) * self.window.cols() + (col - self.window.col_start)]
            }
        };
        self.grid.apply_nodata_check(value)
    }

    fn width(&self) -> usize {
        self.window.cols()
    }

    fn height(&self) -> usize {
        self.window.rows()
    }
}

impl DsmGrid {
    pub fn new(
        transform: GeoTransform,
        width: usize,
        height: usize,
        data: Vec<f32>,
        no_data_value: Option<f64>,
    ) -> Result<Self> {
        if data.len() != width * height {
            return Err(PlanError::Input(format!(
                "DSM buffer holds {} cells, expected {width}x{height}",
                data.len()
            )));
        }

        Ok(Self {
            transform,
            width,
            height,
            no_data_value,
            cells: CellStore::Memory(Arc::new(data)),
        })
    }

    /// Grid reading band 1 of `dataset` one window at a time.
    pub fn windowed(
        transform: GeoTransform,
        width: usize,
        height: usize,
        dataset: Dataset,
        no_data_value: Option<f64>,
    ) -> Self {
        Self {
            transform,
            width,
            height,
            no_data_value,
            cells: CellStore::Band(Arc::new(Mutex::new(dataset))),
        }
    }

    pub fn is_preloaded(&self) -> bool {
        matches!(self.cells, CellStore::Memory(_))
    }

    pub fn extent(&self) -> Rect<f64> {
        self.transform.extent(self.width, self.height)
    }

    /// Maximum valid cell value under `zone`.
    ///
    /// Cells count when their centre lies inside the zone. Zones too thin to
    /// cover any centre fall back to every cell they touch. `None` when the
    /// zone misses the raster or only covers nodata.
    pub fn max_within(&self, zone: &Polygon<f64>) -> Result<Option<f32>> {
        let Some(window) = zone.bounding_rect().and_then(|r| self.window_for(r)) else {
            return Ok(None);
        };
        let view = self.view(window)?;

        Ok(fold_window(&view, window, |col, row| {
            zone.contains(&Point::from(self.transform.cell_center(col, row)))
        })
        .or_else(|| fold_window(&view, window, |col, row| zone.intersects(&self.cell_polygon(col, row)))))
    }

    pub fn view(&self, window: CellWindow) -> Result<WindowView<'_>> {
        let cells = match &self.cells {
            CellStore::Memory(data) => WindowCells::Borrowed(data.as_slice()),
            CellStore::Band(dataset) => {
                let dataset = dataset
                    .lock()
                    .map_err(|_| PlanError::Input("DSM reader lock poisoned".into()))?;
                let band = dataset.rasterband(1)?;
                let size = (window.cols(), window.rows());
                let buffer = band.read_as::<f32>(
                    (window.col_start as isize, window.row_start as isize),
                    size,
                    size,
                    None,
                )?;
                WindowCells::Owned(buffer.data().to_vec())
            }
        };

        Ok(WindowView {
            grid: self,
            window,
            cells,
        })
    }

    fn window_for(&self, rect: Rect<f64>) -> Option<CellWindow> {
        let corners = [
            self.transform.geo_to_pixel(rect.min().x, rect.min().y),
            self.transform.geo_to_pixel(rect.max().x, rect.min().y),
            self.transform.geo_to_pixel(rect.max().x, rect.max().y),
            self.transform.geo_to_pixel(rect.min().x, rect.max().y),
        ];

        let min_u = corners.iter().map(|c| c.x).fold(f64::MAX, f64::min);
        let max_u = corners.iter().map(|c| c.x).fold(f64::MIN, f64::max);
        let min_v = corners.iter().map(|c| c.y).fold(f64::MAX, f64::min);
        let max_v = corners.iter().map(|c| c.y).fold(f64::MIN, f64::max);

        let col_start = min_u.floor().max(0.0);
        let row_start = min_v.floor().max(0.0);
        let col_end = max_u.ceil().min(self.width as f64);
        let row_end = max_v.ceil().min(self.height as f64);

        if col_start >= col_end || row_start >= row_end {
            return None;
        }

        Some(CellWindow {
            col_start: col_start as usize,
            col_end: col_end as usize,
            row_start: row_start as usize,
            row_end: row_end as usize,
        })
    }

    fn cell_polygon(&self, col: usize, row: usize) -> Polygon<f64> {
        let (c, r) = (col as f64, row as f64);
        let ring = vec![
            self.transform.pixel_to_geo(c, r),
            self.transform.pixel_to_geo(c + 1.0, r),
            self.transform.pixel_to_geo(c + 1.0, r + 1.0),
            self.transform.pixel_to_geo(c, r + 1.0),
            self.transform.pixel_to_geo(c, r),
        ];
        Polygon::new(ring.into(), vec![])
    }

    #[inline(always)]
    fn apply_nodata_check(&self, val: f32) -> Option<f32> {
        if !val.is_not_nan() {
            return None;
        }
        if let Some(no_data) = self.no_data_value {
            if val.approx_eq(no_data as f32, 1e-6) {
                return None;
            }
        }
        Some(val)
    }
}

fn fold_window<S, F>(source: &S, window: CellWindow, include: F) -> Option<f32>
where
    S: PixelSource,
    F: Fn(usize, usize) -> bool,
{
    let mut max: Option<f32> = None;

    for row in window.row_start..window.row_end {
        for col in window.col_start..window.col_end {
            let Some(value) = source.read_at(col as isize, row as isize) else {
                continue;
            };
            if !include(col, row) {
                continue;
            }
            max = Some(max.map_or(value, |m| m.max(value)));
        }
    }
    max
}

impl PixelSource for DsmGrid {
    fn read_at(&self, col: isize, row: isize) -> Option<f32> {
        if col < 0 || row < 0 || col >= self.width as isize || row >= self.height as isize {
            return None;
        }

        let (c, r) = (col as usize, row as usize);
        let cell = CellWindow {
            col_start: c,
            col_end: c + 1,
            row_start: r,
            row_end: r + 1,
        };
        self.view(cell).ok()?.read_at(col, row)
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}
