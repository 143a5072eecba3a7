use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{IoError, Result};
use fem_solver::{Mesh, SymmetricSparseMatrix, TestFunction};
use nalgebra::DVector;

pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write one line per node: `index x y u_h u |u_h-u|`
pub fn write_nodal_table(
    path: impl AsRef<Path>,
    mesh: &Mesh,
    values: &DVector<f64>,
    exact: &dyn TestFunction,
) -> Result<()> {
    if values.len() != mesh.num_nodes() {
        return Err(IoError::InvalidData(format!(
            "{} nodal values for a mesh of {} nodes",
            values.len(),
            mesh.num_nodes()
        )));
    }

    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let mut out = BufWriter::new(fs::File::create(path)?);
    writeln!(out, "# index x y u_h u |u_h-u|")?;
    for (i, (&p, &u_h)) in mesh.points().iter().zip(values.iter()).enumerate() {
        let u = exact.u(p);
        writeln!(
            out,
            "{} {:.12e} {:.12e} {:.12e} {:.12e} {:.6e}",
            i,
            p.x,
            p.y,
            u_h,
            u,
            (u_h - u).abs()
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write the full symmetric matrix as a tab-separated dense table
pub fn write_dense_matrix(path: impl AsRef<Path>, matrix: &SymmetricSparseMatrix) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let dense = matrix.to_dense();
    let mut out = BufWriter::new(fs::File::create(path)?);
    for row in dense.row_iter() {
        let line: Vec<String> = row.iter().map(|v| format!("{:.6e}", v)).collect();
        writeln!(out, "{}", line.join("\t"))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fem_solver::{FiniteElement, FnTest, Point2D, Portrait};

    fn two_node_mesh() -> Mesh {
        Mesh::new(
            vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.5)],
            vec![FiniteElement::new(vec![0, 1])],
        )
        .unwrap()
    }

    #[test]
    fn nodal_table_has_one_line_per_node() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("nodes.txt");
        let mesh = two_node_mesh();
        let test = FnTest::new(|p| p.x + p.y, |_| 0.0);
        let values = DVector::from_vec(vec![0.0, 1.25]);

        write_nodal_table(&path, &mesh, &values, &test).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('#'));

        let fields: Vec<f64> = lines[2]
            .split_whitespace()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(fields[0], 1.0);
        assert_eq!(fields[3], 1.25);
        assert_eq!(fields[4], 1.5);
        assert!((fields[5] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn nodal_table_rejects_wrong_length() {
        let dir = tempfile::tempdir().unwrap();
        let test = FnTest::new(|_| 0.0, |_| 0.0);
        let err = write_nodal_table(
            dir.path().join("n.txt"),
            &two_node_mesh(),
            &DVector::zeros(3),
            &test,
        )
        .unwrap_err();
        assert!(matches!(err, IoError::InvalidData(_)));
    }

    #[test]
    fn dense_matrix_dump_is_symmetric() {
        let mut a = SymmetricSparseMatrix::from_portrait(Portrait::build(&two_node_mesh()));
        a.add(0, 0, 2.0).unwrap();
        a.add(1, 1, 3.0).unwrap();
        a.add(1, 0, -1.0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.txt");
        write_dense_matrix(&path, &a).unwrap();

        let rows: Vec<Vec<f64>> = fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| line.split('\t').map(|s| s.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows, vec![vec![2.0, -1.0], vec![-1.0, 3.0]]);
    }
}
