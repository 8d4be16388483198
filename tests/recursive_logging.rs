// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use log::Record;
use logwright::Dispatch;
use logwright::Layout;
use logwright::LoggerRepository;
use logwright::append;
use logwright::append::FileBuilder;

#[derive(Debug)]
struct CustomLayout(&'static str);

impl Layout for CustomLayout {
    fn format(&self, record: &Record) -> anyhow::Result<Vec<u8>> {
        Ok(format!("{} [{}] {}", self.0, record.level(), record.args()).into_bytes())
    }
}

// the repository must not hold its lock while appending
#[test]
fn test_meta_logging_in_format_works() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recursive.log");

    let repository = LoggerRepository::new();
    let root = repository.root();
    root.add_dispatch(Arc::new(Dispatch::new(
        "out",
        append::Stdout::default().with_layout(CustomLayout("out")),
    )));
    root.add_dispatch(Arc::new(Dispatch::new(
        "err",
        append::Stderr::default().with_layout(CustomLayout("err")),
    )));
    root.add_dispatch(Arc::new(Dispatch::new(
        "file",
        FileBuilder::new(&path)
            .layout(CustomLayout("file"))
            .build()
            .unwrap(),
    )));
    repository.apply().unwrap();

    struct Thing<'a>(&'a str);

    impl std::fmt::Display for Thing<'_> {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            log::debug!("formatting wrapping ({})", self.0);
            f.write_str(self.0)
        }
    }

    log::info!("I'm logging {}!", Thing("aha"));
    log::logger().flush();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("file [INFO] I'm logging aha!"), "{written}");
    assert!(written.contains("file [DEBUG] formatting wrapping (aha)"), "{written}");
}
