/// Union-find specialised for single linkage tree construction: every union
/// creates a fresh internal node label rather than reusing a root, so the
/// sequence of merges can be read back as a dendrogram.
pub(crate) struct UnionFind {
    parent: Vec<Option<usize>>,
    size: Vec<usize>,
    next_label: usize,
}

impl UnionFind {
    pub(crate) fn new(n_samples: usize) -> Self {
        let capacity = 2 * n_samples - 1;
        let size = (0..capacity).map(|n| usize::from(n < n_samples)).collect();
        UnionFind {
            parent: vec![None; capacity],
            size,
            next_label: n_samples,
        }
    }

    pub(crate) fn union(&mut self, m: usize, n: usize) {
        self.parent[m] = Some(self.next_label);
        self.parent[n] = Some(self.next_label);
        self.size[self.next_label] = self.size[m] + self.size[n];
        self.next_label += 1;
    }

    pub(crate) fn find(&mut self, n: usize) -> usize {
        let mut root = n;
        while let Some(parent) = self.parent[root] {
            root = parent;
        }
        // Path compression
        let mut current = n;
        while let Some(parent) = self.parent[current] {
            self.parent[current] = Some(root);
            current = parent;
        }
        root
    }

    pub(crate) fn size_of(&self, n: usize) -> usize {
        self.size[n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_create_fresh_labels() {
        let mut uf = UnionFind::new(4);
        uf.union(0, 1);
        assert_eq!(uf.find(0), 4);
        assert_eq!(uf.find(1), 4);
        assert_eq!(uf.size_of(4), 2);

        uf.union(4, 2);
        assert_eq!(uf.find(0), 5);
        assert_eq!(uf.find(2), 5);
        assert_eq!(uf.size_of(5), 3);
        assert_eq!(uf.find(3), 3);
    }
}
