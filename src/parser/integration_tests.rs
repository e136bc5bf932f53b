// 集成测试：用真实的 EPUB 压缩包和 PDF 文件走完整的导入流程

#[cfg(test)]
mod integration_tests {
    use crate::parser::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// 测试用章节：(id, 文件名, 正文 HTML)，正文为 None 时文件不写入压缩包
    struct TestSection {
        id: &'static str,
        file: &'static str,
        body: Option<&'static str>,
    }

    fn section(id: &'static str, file: &'static str, body: Option<&'static str>) -> TestSection {
        TestSection { id, file, body }
    }

    /// 测试书籍的目录形式
    #[derive(Clone, Copy)]
    enum TestToc<'a> {
        /// 没有目录
        Missing,
        /// EPUB 2 的 NCX navMap 内容
        Ncx(&'a str),
        /// EPUB 3 导航文档（OEBPS/nav/toc.xhtml）中 `<ol>` 的内容
        NavDocument(&'a str),
    }

    fn stored() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    }

    /// 在内存中构造一个 EPUB 文件，使用导航文档时为 EPUB 3，否则为 EPUB 2
    fn build_epub(sections: &[TestSection], toc: TestToc) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        writer.start_file("mimetype", stored()).unwrap();
        writer.write_all(b"application/epub+zip").unwrap();

        writer.start_file("META-INF/container.xml", stored()).unwrap();
        writer
            .write_all(
                br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
            )
            .unwrap();

        let mut manifest = String::new();
        let mut spine = String::new();
        for s in sections {
            manifest.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
                s.id, s.file
            ));
            spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", s.id));
        }
        let (version, spine_open) = match toc {
            TestToc::Missing => ("2.0", "<spine>"),
            TestToc::Ncx(_) => {
                manifest.push_str("    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n");
                ("2.0", "<spine toc=\"ncx\">")
            }
            TestToc::NavDocument(_) => {
                manifest.push_str(
                    "    <item id=\"nav\" href=\"nav/toc.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
                );
                ("3.0", "<spine>")
            }
        };

        let opf = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="{version}" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Test Book</dc:title>
    <dc:identifier id="BookId">urn:uuid:0d6f4c0a-5a3e-4f5e-9d1b-3c2a1b0e9f8d</dc:identifier>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
{manifest}  </manifest>
  {spine_open}
{spine}  </spine>
</package>"#
        );
        writer.start_file("OEBPS/content.opf", stored()).unwrap();
        writer.write_all(opf.as_bytes()).unwrap();

        match toc {
            TestToc::Missing => {}
            TestToc::Ncx(nav_map) => {
                let ncx = format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:0d6f4c0a-5a3e-4f5e-9d1b-3c2a1b0e9f8d"/></head>
  <docTitle><text>Test Book</text></docTitle>
  <navMap>
{nav_map}
  </navMap>
</ncx>"#
                );
                writer.start_file("OEBPS/toc.ncx", stored()).unwrap();
                writer.write_all(ncx.as_bytes()).unwrap();
            }
            TestToc::NavDocument(items) => {
                let nav = format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Contents</title></head>
<body>
  <nav epub:type="toc" id="toc">
    <h1>Contents</h1>
    <ol>
{items}
    </ol>
  </nav>
</body>
</html>"#
                );
                writer.start_file("OEBPS/nav/toc.xhtml", stored()).unwrap();
                writer.write_all(nav.as_bytes()).unwrap();
            }
        }

        for s in sections {
            if let Some(body) = s.body {
                let xhtml = format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{}</title></head><body>{}</body></html>"#,
                    s.id, body
                );
                writer.start_file(format!("OEBPS/{}", s.file), stored()).unwrap();
                writer.write_all(xhtml.as_bytes()).unwrap();
            }
        }

        writer.finish().unwrap().into_inner()
    }

    fn nav_point(id: &str, order: usize, label: &str, src: &str, children: &str) -> String {
        format!(
            r#"<navPoint id="{id}" playOrder="{order}"><navLabel><text>{label}</text></navLabel><content src="{src}"/>{children}</navPoint>"#
        )
    }

    #[tokio::test]
    async fn test_epub_two_chapters_with_toc() {
        let nav = format!(
            "{}{}",
            nav_point("n1", 1, "Chapter One", "ch1.xhtml", ""),
            nav_point("n2", 2, "Chapter Two", "ch2.xhtml", "")
        );
        let bytes = build_epub(
            &[
                section("c1", "ch1.xhtml", Some("<p>Chapter One</p>")),
                section("c2", "ch2.xhtml", Some("<p>Chapter Two</p>")),
            ],
            TestToc::Ncx(&nav),
        );

        let content = parse_file(&InputFile::from_bytes("Book.EPUB", bytes)).await.unwrap();

        assert_eq!(content.text, "Chapter One Chapter Two");
        assert!(content.has_to_c);
        assert_eq!(content.chapters.len(), 2);
        assert_eq!(content.chapters[0].id, "c1");
        assert_eq!(content.chapters[0].title, "Chapter One");
        assert_eq!(content.chapters[1].title, "Chapter Two");
        assert_eq!(content.chapters[1].word_start_index, 2);
        assert_eq!(content.chapters[1].word_end_index, 3);
    }

    #[tokio::test]
    async fn test_epub_failed_section_is_skipped() {
        let nav = format!(
            "{}{}",
            nav_point("n1", 1, "Lost", "ch1.xhtml", ""),
            nav_point("n2", 2, "Kept", "ch2.xhtml", "")
        );
        let bytes = build_epub(
            &[
                section("c1", "ch1.xhtml", None),
                section("c2", "ch2.xhtml", Some("<p>Only this survives</p>")),
            ],
            TestToc::Ncx(&nav),
        );

        let content = parse_file(&InputFile::from_bytes("book.epub", bytes)).await.unwrap();

        assert_eq!(content.text, "Only this survives");
        assert_eq!(content.chapters.len(), 1);
        assert_eq!(content.chapters[0].title, "Kept");
        assert_eq!(content.chapters[0].word_start_index, 0);
        assert_eq!(content.chapters[0].word_end_index, 2);
    }

    #[tokio::test]
    async fn test_epub_without_toc() {
        let bytes = build_epub(
            &[section(
                "c1",
                "ch1.xhtml",
                Some("<h1>Heading</h1><p>First paragraph here.</p><p>Second one.</p>"),
            )],
            TestToc::Missing,
        );

        let content = parse_file(&InputFile::from_bytes("book.epub", bytes)).await.unwrap();

        assert_eq!(content.text, "Heading First paragraph here. Second one.");
        assert!(!content.has_to_c);
        assert!(content.chapters.is_empty());
        assert_eq!(content.paragraph_breaks, vec![0, 1, 4]);
    }

    #[tokio::test]
    async fn test_epub_nested_toc_levels() {
        let nav = nav_point(
            "n1",
            1,
            "Part One",
            "part1.xhtml",
            &nav_point("n2", 2, "Chapter 1", "ch1.xhtml", ""),
        );
        let bytes = build_epub(
            &[
                section("p1", "part1.xhtml", Some("<h1>Part One</h1>")),
                section("c1", "ch1.xhtml", Some("<p>Deep inside</p>")),
            ],
            TestToc::Ncx(&nav),
        );

        let content = parse_file(&InputFile::from_bytes("book.epub", bytes)).await.unwrap();

        assert_eq!(content.chapters.len(), 2);
        assert_eq!(content.chapters[0].level, 0);
        assert_eq!(content.chapters[1].title, "Chapter 1");
        assert_eq!(content.chapters[1].level, 1);
    }

    #[tokio::test]
    async fn test_epub_from_disk() {
        let nav = nav_point("n1", 1, "Only Chapter", "ch1.xhtml", "");
        let bytes = build_epub(&[section("c1", "ch1.xhtml", Some("<p>Read from disk</p>"))], TestToc::Ncx(&nav));

        let mut file = tempfile::Builder::new().suffix(".epub").tempfile().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let content = parse_file(&InputFile::from_path(file.path())).await.unwrap();
        assert_eq!(content.text, "Read from disk");
        assert_eq!(content.chapters[0].title, "Only Chapter");
    }

    #[tokio::test]
    async fn test_corrupt_epub_is_an_error() {
        let result = parse_file(&InputFile::from_bytes("broken.epub", b"PK not really".to_vec())).await;
        assert!(matches!(result, Err(ParseError::Epub(_))));
    }

    #[tokio::test]
    async fn test_epub3_navigation_document_only() {
        let items = r#"      <li><a href="../ch1.xhtml">Chapter One</a></li>
      <li><a href="../ch2.xhtml#start">Chapter Two</a>
        <ol><li><a href="../ch3.xhtml">Interlude</a></li></ol>
      </li>"#;
        let bytes = build_epub(
            &[
                section("c1", "ch1.xhtml", Some("<p>Chapter One</p>")),
                section("c2", "ch2.xhtml", Some("<p>Chapter Two</p>")),
                section("c3", "ch3.xhtml", Some("<p>A short pause</p>")),
            ],
            TestToc::NavDocument(items),
        );

        let content = parse_file(&InputFile::from_bytes("book.epub", bytes)).await.unwrap();

        assert_eq!(content.text, "Chapter One Chapter Two A short pause");
        assert!(content.has_to_c);
        assert_eq!(content.chapters.len(), 3);
        assert_eq!(content.chapters[0].title, "Chapter One");
        assert_eq!(content.chapters[0].level, 0);
        assert_eq!(content.chapters[1].title, "Chapter Two");
        assert_eq!(content.chapters[1].word_start_index, 2);
        assert_eq!(content.chapters[2].title, "Interlude");
        assert_eq!(content.chapters[2].level, 1);
        assert_eq!(content.chapters[2].word_end_index, 6);
    }

    /// 在内存中构造一个使用 Helvetica 的纯文本 PDF，每页若干行
    fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                (0..pages.len()).map(|i| format!("{} 0 R", 4 + 2 * i)).collect::<Vec<_>>().join(" "),
                pages.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
        ];

        for (i, lines) in pages.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            ));
            let shown: Vec<String> = lines.iter().map(|line| format!("({}) Tj", line)).collect();
            let stream = format!("BT /F1 24 Tf 72 720 Td {} ET", shown.join(" 0 -30 Td "));
            objects.push(format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream));
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_start = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        pdf.extend_from_slice(xref.as_bytes());
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_start
            )
            .as_bytes(),
        );
        pdf
    }

    #[tokio::test]
    async fn test_pdf_two_pages() {
        let bytes = build_pdf(&[&["Speed reading", "starts here..."], &["Second page!!"]]);

        let content = parse_file(&InputFile::from_bytes("doc.PDF", bytes)).await.unwrap();

        assert_eq!(content.text, "Speed reading starts here. Second page!");
        assert_eq!(content.paragraph_breaks, vec![0]);
        assert!(content.chapters.is_empty());
        assert!(!content.has_to_c);
    }

    #[tokio::test]
    async fn test_pdf_synthetic_breaks_follow_options() {
        let bytes = build_pdf(&[&["one two three four five"], &["six seven"]]);
        let options = ParserOptions { pdf_paragraph_width: 3 };

        let content = parse_file_with(&InputFile::from_bytes("doc.pdf", bytes), &options)
            .await
            .unwrap();

        assert_eq!(content.word_count(), 7);
        assert_eq!(content.paragraph_breaks, vec![0, 3, 6]);
    }
}
