//! Shared corpus fixtures for the integration suites.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use corpus::{CorpusData, InMemoryCorpus, LicenseRecord, RuleRecord};

pub const MIT_TEXT: &str = "Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.";

pub const GPL_CHOICE: &str = "This program is free software; you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 2 of the License, or
(at your option) version 3.";

pub const APACHE_NOTICE: &str = "Licensed under the Apache License, Version 2.0 (the \"License\");
you may not use this file except in compliance with the License.";

pub const MIT_REFERENCE: &str = "This project is distributed under the terms of the MIT license.";

pub fn licenses() -> Vec<LicenseRecord> {
    vec![
        LicenseRecord::new("mit")
            .with_short_name("MIT License")
            .with_name("MIT License")
            .with_category("Permissive")
            .with_owner("MIT")
            .with_homepage_url("http://opensource.org/licenses/mit-license.php")
            .with_text_url("http://opensource.org/licenses/mit-license.php")
            .with_spdx_license_key("MIT")
            .with_text(MIT_TEXT),
        LicenseRecord::new("gpl-2.0")
            .with_short_name("GPL 2.0")
            .with_category("Copyleft")
            .with_owner("Free Software Foundation (FSF)")
            .with_spdx_license_key("GPL-2.0"),
        LicenseRecord::new("gpl-3.0")
            .with_short_name("GPL 3.0")
            .with_category("Copyleft")
            .with_owner("Free Software Foundation (FSF)")
            .with_spdx_license_key("GPL-3.0"),
        LicenseRecord::new("apache-2.0")
            .with_short_name("Apache 2.0")
            .with_category("Permissive")
            .with_owner("Apache Software Foundation")
            .with_spdx_license_key("Apache-2.0"),
    ]
}

pub fn rules() -> Vec<RuleRecord> {
    vec![
        RuleRecord::new("gpl-2.0_or_gpl-3.0.RULE", GPL_CHOICE, ["gpl-2.0", "gpl-3.0"])
            .with_license_choice(true),
        RuleRecord::new("apache-2.0_notice.RULE", APACHE_NOTICE, ["apache-2.0"]),
        RuleRecord::new("mit_reference.RULE", MIT_REFERENCE, ["mit"]).with_relevance(20),
    ]
}

pub fn corpus_data() -> CorpusData {
    CorpusData {
        licenses: licenses(),
        rules: rules(),
    }
}

pub fn in_memory() -> InMemoryCorpus {
    InMemoryCorpus::new(licenses(), rules())
}

/// Lines of noise that share no token window with any rule.
pub fn filler(lines: usize) -> String {
    (1..=lines)
        .map(|i| format!("quokka narwhal {i} axolotl\n"))
        .collect()
}

/// Lay the fixture corpus out as a directory corpus under `root`.
pub fn write_corpus_dir(root: &Path) {
    let licenses = root.join("licenses");
    let rules = root.join("rules");
    fs::create_dir_all(&licenses).unwrap();
    fs::create_dir_all(&rules).unwrap();

    fs::write(
        licenses.join("mit.yml"),
        "short_name: MIT License\nname: MIT License\ncategory: Permissive\nowner: MIT\n\
         homepage_url: http://opensource.org/licenses/mit-license.php\n\
         text_urls:\n  - http://opensource.org/licenses/mit-license.php\n\
         spdx_license_key: MIT\n",
    )
    .unwrap();
    fs::write(licenses.join("mit.LICENSE"), MIT_TEXT).unwrap();
    fs::write(
        licenses.join("gpl-2.0.yml"),
        "short_name: GPL 2.0\ncategory: Copyleft\nspdx_license_key: GPL-2.0\n",
    )
    .unwrap();
    fs::write(
        licenses.join("gpl-3.0.yml"),
        "short_name: GPL 3.0\ncategory: Copyleft\nspdx_license_key: GPL-3.0\n",
    )
    .unwrap();
    fs::write(
        licenses.join("apache-2.0.yml"),
        "short_name: Apache 2.0\ncategory: Permissive\nspdx_license_key: Apache-2.0\n",
    )
    .unwrap();

    fs::write(
        rules.join("gpl-2.0_or_gpl-3.0.yml"),
        "licenses:\n  - gpl-2.0\n  - gpl-3.0\nlicense_choice: true\n",
    )
    .unwrap();
    fs::write(rules.join("gpl-2.0_or_gpl-3.0.RULE"), GPL_CHOICE).unwrap();
    fs::write(rules.join("apache-2.0_notice.yml"), "licenses: [apache-2.0]\n").unwrap();
    fs::write(rules.join("apache-2.0_notice.RULE"), APACHE_NOTICE).unwrap();
    fs::write(
        rules.join("mit_reference.yml"),
        format!("licenses: [mit]\nrelevance: 20\ntext: \"{MIT_REFERENCE}\"\n"),
    )
    .unwrap();
}
